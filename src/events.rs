/// What changed in a mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MappingChange {
    ProviderReplaced,
    LeftCut { old: isize, new: isize },
    RightCut { old: isize, new: isize },
    Anchor { old: isize, new: isize },
    ShiftChanges,
}

/// A change notification. `more_events_upcoming` is set on all but the last
/// event caused by the same operation, so repaints can be batched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MappingEvent {
    pub change: MappingChange,
    pub more_events_upcoming: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subscription {
    Keep,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(usize);

type Listener = Box<dyn FnMut(&MappingEvent) -> Subscription>;

#[derive(Default)]
pub struct ListenerSet {
    next_id: usize,
    listeners: Vec<(ListenerId, Listener)>,
}

impl std::fmt::Debug for ListenerSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerSet")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl ListenerSet {
    pub fn subscribe(
        &mut self,
        listener: impl FnMut(&MappingEvent) -> Subscription + 'static,
    ) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let count = self.listeners.len();
        self.listeners.retain(|(l_id, _)| *l_id != id);
        self.listeners.len() != count
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Delivers the changes in order, flagging all but the last one with
    /// `more_events_upcoming`. Listeners returning [`Subscription::Cancel`]
    /// are removed once the whole batch is delivered.
    pub fn dispatch(&mut self, changes: &[MappingChange]) {
        let mut cancelled = Vec::new();

        for (i, &change) in changes.iter().enumerate() {
            let event = MappingEvent {
                change,
                more_events_upcoming: i + 1 < changes.len(),
            };

            for (id, listener) in self.listeners.iter_mut() {
                if cancelled.contains(id) {
                    continue;
                }
                if listener(&event) == Subscription::Cancel {
                    cancelled.push(*id);
                }
            }
        }

        if !cancelled.is_empty() {
            self.listeners.retain(|(id, _)| !cancelled.contains(id));
        }
    }
}
