use anyhow::Result;
use serde_json::json;

use malhf::{Mode, Relation, RelationConfig};

pub fn exec(name: String, json_out: bool) -> Result<()> {
    let mut rel = Relation::open(&name, Mode::Read, RelationConfig::from_env())?;
    let stats = rel.stats()?;

    if json_out {
        let buckets: Vec<_> = stats
            .buckets
            .iter()
            .enumerate()
            .map(|(bucket, chain)| {
                let pages: Vec<_> = chain
                    .iter()
                    .map(|p| {
                        json!({
                            "page_id": p.page_id,
                            "in_overflow": p.in_overflow,
                            "ntuples": p.ntuples,
                            "free_space": p.free_space,
                            "ovflow": if p.ovflow == u32::MAX { None } else { Some(p.ovflow) },
                        })
                    })
                    .collect();
                json!({ "bucket": bucket, "pages": pages })
            })
            .collect();

        let out = json!({
            "nattrs": stats.nattrs,
            "depth": stats.depth,
            "sp": stats.sp,
            "npages": stats.npages,
            "ntups": stats.ntups,
            "chvec": stats.chvec,
            "buckets": buckets,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        print!("{stats}");
    }

    rel.close()?;
    Ok(())
}
