use anyhow::Result;

use malhf::{Mode, Query, Relation, RelationConfig};

pub fn exec(name: String, pattern: String) -> Result<()> {
    let rel = Relation::open(&name, Mode::Read, RelationConfig::from_env())?;
    let page_size = rel.page_size() as usize;

    let mut q = Query::start(&rel, &pattern)?;
    let mut count = 0u64;
    while let Some(tuple) = q.next_tuple(page_size)? {
        println!("{tuple}");
        count += 1;
    }
    q.close();
    println!("{count} tuple(s) matched '{pattern}'");
    rel.close()?;
    Ok(())
}
