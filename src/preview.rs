use anyhow::{Context, Result};
use log::info;

use crate::{cli::PreviewArgs, formats, table};

pub fn execute(args: &PreviewArgs) -> Result<()> {
    let options = args.source.load_options(false)?;
    let loaded = formats::load_table(&args.input, &options)
        .with_context(|| format!("Loading {:?}", args.input))?;

    let headers = loaded.column_names();
    let rows = loaded.text_rows(Some(args.rows));
    table::print_table(&headers, &rows);
    info!(
        "Displayed {} of {} row(s) from {:?}",
        rows.len(),
        loaded.row_count(),
        args.input
    );
    Ok(())
}
