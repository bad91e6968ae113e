use crate::cli::UnitsArgs;
use crate::error::Result;
use potkit::core::units::{Quantity, Unit};

pub fn run(args: UnitsArgs) -> Result<()> {
    println!("{}", describe(&args.expression)?);
    if let Some(target) = &args.to {
        println!("{}", convert(args.value, &args.expression, target)?);
    }
    Ok(())
}

fn describe(expression: &str) -> Result<String> {
    let unit = Unit::parse(expression)?;
    Ok(format!(
        "{} = {:e} SI [{}]",
        unit,
        unit.factor(),
        unit.dimension()
    ))
}

fn convert(value: f64, from: &str, to: &str) -> Result<String> {
    let quantity = Quantity::parse(value, from)?;
    let converted = quantity.convert(to)?;
    Ok(format!("{} {} = {} {}", value, from, converted.value(), to))
}
