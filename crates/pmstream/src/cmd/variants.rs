use crate::cmd::VariantsArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::{render_variants, OutputFormat};

pub fn run(args: VariantsArgs) -> CliResult<i32> {
    let format = args.format.unwrap_or_else(OutputFormat::default_for_stdout);
    println!("{}", render_variants(format));
    Ok(SUCCESS)
}
