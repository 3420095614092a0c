use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, Result};

use malhf::{Mode, Relation, RelationConfig};

pub fn exec(name: String, tuple: Option<String>, file: Option<PathBuf>) -> Result<()> {
    let mut rel = Relation::open(&name, Mode::Write, RelationConfig::from_env())?;

    match (tuple, file) {
        (Some(t), None) => {
            rel.insert(&t)?;
            println!("inserted '{t}' ({} tuples total)", rel.ntuples());
        }
        (None, Some(path)) => {
            let body = fs::read_to_string(&path)?;
            let mut inserted = 0u64;
            for line in body.lines() {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                rel.insert(line)?;
                inserted += 1;
            }
            println!(
                "bulk-inserted {inserted} tuple(s) from '{}' ({} tuples total)",
                path.display(),
                rel.ntuples()
            );
        }
        (Some(_), Some(_)) => {
            return Err(anyhow!("insert: pass exactly one of --tuple or --file, not both"))
        }
        (None, None) => return Err(anyhow!("insert: one of --tuple or --file is required")),
    }

    rel.close()?;
    Ok(())
}
