use std::path::Path;

use crate::error::{MappingError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Nucleotide {
    A = 0,
    C = 1,
    G = 2,
    T = 3,
}

impl Nucleotide {
    pub const ALL: [Nucleotide; 4] = [Self::A, Self::C, Self::G, Self::T];

    pub fn complement(self) -> Self {
        match self {
            Self::A => Self::T,
            Self::C => Self::G,
            Self::G => Self::C,
            Self::T => Self::A,
        }
    }

    pub fn from_base(base: u8) -> Option<Self> {
        match base.to_ascii_uppercase() {
            b'A' => Some(Self::A),
            b'C' => Some(Self::C),
            b'G' => Some(Self::G),
            b'T' | b'U' => Some(Self::T),
            _ => None,
        }
    }
}

/// Complement of a single IUPAC base call, keeping the case.
pub fn complement_base(base: u8) -> u8 {
    let comp = match base.to_ascii_uppercase() {
        b'A' => b'T',
        b'T' | b'U' => b'A',
        b'C' => b'G',
        b'G' => b'C',
        b'R' => b'Y',
        b'Y' => b'R',
        b'K' => b'M',
        b'M' => b'K',
        b'B' => b'V',
        b'V' => b'B',
        b'D' => b'H',
        b'H' => b'D',
        // S, W, N and anything else are their own complement
        other => other,
    };

    if base.is_ascii_lowercase() {
        comp.to_ascii_lowercase()
    } else {
        comp
    }
}

/// Read-only source of the base calls and trace of a sequencing read.
pub trait ReferenceProvider {
    /// Number of base calls.
    fn sequence_len(&self) -> usize;

    fn base_call(&self, index: usize) -> u8;

    /// Offset of the trace sample the base call at `index` was made at.
    fn base_call_position(&self, index: usize) -> usize;

    fn quality(&self, _index: usize) -> Option<u8> {
        None
    }

    /// Number of samples per trace channel.
    fn trace_len(&self) -> usize;

    fn trace_value(&self, nucleotide: Nucleotide, sample: usize) -> u16;

    fn reverse_complement(&self) -> Self
    where
        Self: Sized;
}

/// In-memory trace data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceData {
    base_calls: Vec<u8>,
    base_call_positions: Vec<usize>,
    qualities: Option<Vec<u8>>,
    channels: [Vec<u16>; 4],
}

impl TraceData {
    pub fn new(
        base_calls: Vec<u8>,
        base_call_positions: Vec<usize>,
        qualities: Option<Vec<u8>>,
        channels: [Vec<u16>; 4],
    ) -> Result<Self> {
        let trace_len = channels[0].len();

        let consistent = base_calls.len() == base_call_positions.len()
            && qualities
                .as_ref()
                .map_or(true, |q| q.len() == base_calls.len())
            && channels.iter().all(|ch| ch.len() == trace_len)
            && base_call_positions.iter().all(|&p| p < trace_len);

        if !consistent {
            return Err(MappingError::InconsistentTrace {
                base_calls: base_calls.len(),
                positions: base_call_positions.len(),
                trace_len,
            });
        }

        Ok(Self {
            base_calls,
            base_call_positions,
            qualities,
            channels,
        })
    }

    /// Builds an idealized trace with one peak per base call, evenly spaced
    /// by `samples_per_base`. Ambiguous calls get no peak.
    pub fn from_base_calls(base_calls: &[u8], samples_per_base: usize) -> Self {
        let samples_per_base = samples_per_base.max(1);
        let trace_len = base_calls.len() * samples_per_base;

        let mut channels: [Vec<u16>; 4] = std::array::from_fn(|_| vec![0u16; trace_len]);
        let mut base_call_positions = Vec::with_capacity(base_calls.len());

        let half = (samples_per_base / 2) as isize;

        for (i, &base) in base_calls.iter().enumerate() {
            let center = i * samples_per_base + samples_per_base / 2;
            base_call_positions.push(center);

            let Some(nucl) = Nucleotide::from_base(base) else {
                continue;
            };
            let channel = &mut channels[nucl as usize];

            for d in -half..=half {
                let sample = center as isize + d;
                if sample < 0 || sample >= trace_len as isize {
                    continue;
                }
                let falloff = 1.0 - (d.unsigned_abs() as f32 / (half + 1) as f32);
                let value = (1000.0 * falloff) as u16;
                let slot = &mut channel[sample as usize];
                *slot = (*slot).max(value);
            }
        }

        Self {
            base_calls: base_calls.to_vec(),
            base_call_positions,
            qualities: None,
            channels,
        }
    }

    /// Reads a record from a FASTA file and builds an idealized trace from
    /// it. Takes the first record if `name` is `None`.
    pub fn from_fasta(
        fasta_path: impl AsRef<Path>,
        name: Option<&str>,
        samples_per_base: usize,
    ) -> std::io::Result<Self> {
        let mut fasta_reader = std::fs::File::open(fasta_path)
            .map(std::io::BufReader::new)
            .map(noodles::fasta::Reader::new)?;

        for record in fasta_reader.records() {
            let record = record?;
            let record_name = std::str::from_utf8(record.name()).map_err(|_| {
                std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    "Sequence name was not valid UTF-8",
                )
            })?;

            if name.is_some_and(|n| n != record_name) {
                continue;
            }

            log::info!(
                "Loaded base calls of `{record_name}` ({} bp)",
                record.sequence().len()
            );

            return Ok(Self::from_base_calls(
                record.sequence().as_ref(),
                samples_per_base,
            ));
        }

        Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            match name {
                Some(name) => format!("Sequence `{name}` not found"),
                None => "FASTA file contains no records".to_string(),
            },
        ))
    }

    pub fn base_calls(&self) -> &[u8] {
        &self.base_calls
    }

    pub fn with_qualities(mut self, qualities: Vec<u8>) -> Result<Self> {
        if qualities.len() != self.base_calls.len() {
            return Err(MappingError::InconsistentTrace {
                base_calls: self.base_calls.len(),
                positions: qualities.len(),
                trace_len: self.trace_len(),
            });
        }
        self.qualities = Some(qualities);
        Ok(self)
    }
}

impl ReferenceProvider for TraceData {
    fn sequence_len(&self) -> usize {
        self.base_calls.len()
    }

    fn base_call(&self, index: usize) -> u8 {
        self.base_calls[index]
    }

    fn base_call_position(&self, index: usize) -> usize {
        self.base_call_positions[index]
    }

    fn quality(&self, index: usize) -> Option<u8> {
        self.qualities.as_ref()?.get(index).copied()
    }

    fn trace_len(&self) -> usize {
        self.channels[0].len()
    }

    fn trace_value(&self, nucleotide: Nucleotide, sample: usize) -> u16 {
        self.channels[nucleotide as usize]
            .get(sample)
            .copied()
            .unwrap_or_default()
    }

    fn reverse_complement(&self) -> Self {
        let trace_len = self.trace_len();

        let base_calls = self
            .base_calls
            .iter()
            .rev()
            .copied()
            .map(complement_base)
            .collect();

        let base_call_positions = self
            .base_call_positions
            .iter()
            .rev()
            .map(|&p| trace_len - 1 - p)
            .collect();

        let qualities = self
            .qualities
            .as_ref()
            .map(|q| q.iter().rev().copied().collect());

        // the A trace of the complement strand is the reversed T trace, etc.
        let channels = std::array::from_fn(|i| {
            let source = Nucleotide::ALL[i].complement() as usize;
            self.channels[source].iter().rev().copied().collect()
        });

        Self {
            base_calls,
            base_call_positions,
            qualities,
            channels,
        }
    }
}
