//! Distortion curve table command.

use clap::Args;
use stomp_core::{CurveFamily, synthesize};

#[derive(Args)]
pub struct CurveArgs {
    /// Curve family (e.g. "classic", "sustained"); omit to list families
    #[arg(value_name = "FAMILY")]
    family: Option<String>,

    /// Drive amount, 0..1
    #[arg(short, long, default_value = "0.5")]
    amount: f32,

    /// Number of intervals over [-1, 1]; the table has one more point
    #[arg(short, long, default_value = "16")]
    samples: usize,

    /// Print the table as a JSON array
    #[arg(long)]
    json: bool,
}

pub fn run(args: CurveArgs) -> anyhow::Result<()> {
    let Some(name) = args.family else {
        println!("Curve Families");
        println!("==============\n");
        for family in CurveFamily::ALL {
            println!("  {}", family.name());
        }
        return Ok(());
    };

    let family: CurveFamily = name.parse()?;
    let table = synthesize(family, args.amount, args.samples);

    if args.json {
        println!("{}", serde_json::to_string(&table)?);
        return Ok(());
    }

    println!("{} @ {:.2} ({} points)", family.name(), args.amount, table.len());
    for (x, y) in inputs(args.samples).zip(&table) {
        println!("  {:>7.4}  {:>8.5}", x, y);
    }
    Ok(())
}

/// The x positions `synthesize` samples at.
fn inputs(n: usize) -> impl Iterator<Item = f32> {
    (0..=n).map(move |i| {
        if n == 0 {
            0.0
        } else {
            i as f32 * 2.0 / n as f32 - 1.0
        }
    })
}
