use crate::cli::PatternsArgs;
use crate::descriptor::{FormatDescriptor, Patterns};
use crate::models::Dialect;
use std::collections::BTreeMap;

pub fn run_patterns(args: PatternsArgs) -> Result<(), Box<dyn std::error::Error>> {
    let json = match &args.format {
        Some(format) => serde_json::to_string_pretty(&FormatDescriptor::build(format)?.patterns())?,
        None => serde_json::to_string_pretty(&all_patterns()?)?,
    };
    println!("{}", json);
    Ok(())
}

fn all_patterns() -> Result<BTreeMap<&'static str, Patterns>, Box<dyn std::error::Error>> {
    let mut map = BTreeMap::new();
    for dialect in Dialect::ALL {
        map.insert(dialect.identifier(), FormatDescriptor::for_dialect(dialect)?.patterns());
    }
    Ok(map)
}
