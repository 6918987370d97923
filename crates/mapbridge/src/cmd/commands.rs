use mapbridge_dispatch::names;

use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_names, OutputFormat};

pub fn run(format: OutputFormat) -> CliResult<i32> {
    print_names(names::ALL, format);
    Ok(SUCCESS)
}
