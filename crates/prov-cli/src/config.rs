//! Hand-rolled argument parsing, in the style of a small internal CLI.

#[derive(Debug, Clone)]
pub enum Command {
    Generate(GenerateArgs),
    Search(SearchArgs),
}

#[derive(Debug, Clone)]
pub struct GenerateArgs {
    pub scenario: String,
    pub out: String,
}

#[derive(Debug, Clone)]
pub struct SearchArgs {
    pub doc: String,
    pub entity: String,
    pub strict: bool,
}

#[derive(Debug, Clone)]
pub struct Args {
    pub command: Command,
    pub json_logs: bool,
}

impl Args {
    pub fn parse() -> Result<Self, String> {
        let mut it = std::env::args().skip(1);
        let subcommand = it.next().ok_or_else(usage)?;

        let mut json_logs = false;
        match subcommand.as_str() {
            "generate" => {
                let mut scenario = None;
                let mut out = None;
                while let Some(arg) = it.next() {
                    match arg.as_str() {
                        "--scenario" => scenario = it.next(),
                        "--out" => out = it.next(),
                        "--json-logs" => json_logs = true,
                        other => return Err(format!("unknown flag: {other}")),
                    }
                }
                let scenario = scenario.ok_or_else(|| "missing --scenario".to_string())?;
                let out = out.ok_or_else(|| "missing --out".to_string())?;
                Ok(Self { command: Command::Generate(GenerateArgs { scenario, out }), json_logs })
            }
            "search" => {
                let mut doc = None;
                let mut entity = None;
                let mut strict = false;
                while let Some(arg) = it.next() {
                    match arg.as_str() {
                        "--doc" => doc = it.next(),
                        "--entity" => entity = it.next(),
                        "--strict" => strict = true,
                        "--json-logs" => json_logs = true,
                        other => return Err(format!("unknown flag: {other}")),
                    }
                }
                let doc = doc.ok_or_else(|| "missing --doc".to_string())?;
                let entity = entity.ok_or_else(|| "missing --entity".to_string())?;
                Ok(Self { command: Command::Search(SearchArgs { doc, entity, strict }), json_logs })
            }
            other => Err(format!("unknown subcommand: {other}\n{}", usage())),
        }
    }
}

fn usage() -> String {
    "usage: prov <generate --scenario FILE --out FILE | search --doc FILE --entity ID [--strict]>".to_string()
}
