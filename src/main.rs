use clap::Parser;

use pherogram_map::cli::Cli;
use pherogram_map::config::{self, MapConfig};
use pherogram_map::{
    EditableRow, PherogramMapping, ReferenceProvider, RowMappings, TokenRow, TraceData,
};

pub fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Cli::parse();

    let cfg = match config::load_map_config() {
        Ok(cfg) => cfg,
        Err(err) => {
            log::warn!("Using default configuration: {err}");
            MapConfig::default()
        }
    };

    let cfg = MapConfig {
        samples_per_base: args.samples_per_base.unwrap_or(cfg.samples_per_base),
        ..cfg
    };
    if args.save_config {
        let cfg_path = config::save_map_config(&cfg)?;
        println!("config\t{}", cfg_path.display());
    }

    let samples_per_base = cfg.samples_per_base;
    let trace = TraceData::from_fasta(&args.fasta, args.record.as_deref(), samples_per_base)?;

    let tokens = match args.row {
        Some(row) => row.into_bytes(),
        None => trace.base_calls().to_vec(),
    };

    let name = args.record.as_deref().unwrap_or("read");

    let mut rows = RowMappings::new();
    let row_id = rows.register_row(name);
    let row = TokenRow::new(row_id, tokens, cfg.gap_byte()?).into_shared();
    rows.attach(name, trace, row.clone(), args.anchor)?;

    let mapping = rows
        .get_mut(row_id)
        .ok_or(anyhow::anyhow!("Mapping of row `{name}` missing"))?;

    if let Some(left_cut) = args.left_cut {
        mapping.set_left_cut(left_cut)?;
    }
    if let Some(right_cut) = args.right_cut {
        mapping.set_right_cut(right_cut)?;
    }

    if let Some(script_path) = &args.script {
        let steps = pherogram_map::script::load_script(script_path)?;
        let results = pherogram_map::script::run_script(&steps, &row, mapping)?;

        for (step, relation) in results {
            println!("step {step} ({:?}): {relation}", steps[step]);
        }
    }

    println!("row\t{}", String::from_utf8_lossy(row.borrow().tokens()));
    println!(
        "window\treference {:?}\teditable {:?}",
        mapping.reference_window(),
        mapping.editable_window()
    );
    print_table(mapping, row.borrow().len());

    Ok(())
}

fn print_table<P: ReferenceProvider>(mapping: &PherogramMapping<P>, row_len: usize) {
    println!("#reference\tbase\tcolumn");

    for reference_index in 0..mapping.reference_len() {
        let base = mapping.provider().base_call(reference_index as usize) as char;
        let relation = mapping.editable_index_by_reference_index(reference_index);
        println!("{reference_index}\t{base}\t{relation}");
    }

    let unmapped = (0..row_len as isize)
        .filter(|&column| {
            mapping
                .reference_index_by_editable_index(column)
                .corresponding
                .is_gap()
        })
        .count();
    log::info!("{unmapped} of {row_len} row columns have no base call");
}
