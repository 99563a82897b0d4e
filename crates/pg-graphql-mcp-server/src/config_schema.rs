//! Binary to output the JSON Schema for the server's configuration file

#[allow(dead_code)]
mod runtime;

fn main() -> anyhow::Result<()> {
    let schema = schemars::schema_for!(runtime::Config);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
