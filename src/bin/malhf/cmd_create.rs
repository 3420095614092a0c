use anyhow::Result;

use malhf::{Relation, RelationConfig};

pub fn exec(name: String, nattrs: u32, chvec: Option<String>, npages: u32, depth: u32) -> Result<()> {
    let chvec = chvec.unwrap_or_else(|| malhf::chvec::round_robin_chvec(nattrs));
    let rel = Relation::create(&name, nattrs, npages, depth, &chvec, RelationConfig::from_env())?;
    println!(
        "created relation '{name}': nattrs={} npages={} depth={}",
        rel.nattrs(),
        rel.npages(),
        rel.depth()
    );
    rel.close()?;
    Ok(())
}
