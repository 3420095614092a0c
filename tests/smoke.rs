//! Black-box smoke tests exercising the public API end to end, in the
//! teacher's `tests/smoke.rs` style: one relation per test under a unique
//! temp-dir name, no shared fixtures.

use malhf::{Mode, Query, Relation, RelationConfig};

fn unique_root(tag: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir()
        .join(format!("malhf-smoke-{tag}-{}-{nanos}", std::process::id()))
        .to_string_lossy()
        .into_owned()
}

fn round_robin(nattrs: u32) -> String {
    malhf::chvec::round_robin_chvec(nattrs)
}

fn query_all(rel: &Relation, pattern: &str) -> anyhow::Result<Vec<String>> {
    let mut q = Query::start(rel, pattern)?;
    let mut out = Vec::new();
    while let Some(t) = q.next_tuple(rel.page_size() as usize)? {
        out.push(t);
    }
    q.close();
    Ok(out)
}

#[test]
fn create_and_reopen_roundtrips_header() -> anyhow::Result<()> {
    let name = unique_root("create-reopen");
    let chvec = round_robin(2);

    {
        let rel = Relation::create(&name, 2, 1, 0, &chvec, RelationConfig::default())?;
        rel.close()?;
    }

    let rel = Relation::open(&name, Mode::Read, RelationConfig::default())?;
    assert_eq!(rel.nattrs(), 2);
    assert_eq!(rel.depth(), 0);
    assert_eq!(rel.splitp(), 0);
    assert_eq!(rel.npages(), 1);
    assert_eq!(rel.ntuples(), 0);
    rel.close()?;
    Ok(())
}

#[test]
fn single_insert_and_exact_query() -> anyhow::Result<()> {
    let name = unique_root("single-insert");
    let chvec = round_robin(2);
    let mut rel = Relation::create(&name, 2, 1, 0, &chvec, RelationConfig::default())?;
    rel.insert("apple,red")?;

    let got = query_all(&rel, "apple,red")?;
    assert_eq!(got, vec!["apple,red".to_string()]);
    rel.close()?;
    Ok(())
}

#[test]
fn exact_mismatch_query_yields_nothing() -> anyhow::Result<()> {
    let name = unique_root("exact-mismatch");
    let chvec = round_robin(2);
    let mut rel = Relation::create(&name, 2, 1, 0, &chvec, RelationConfig::default())?;
    rel.insert("apple,red")?;

    let got = query_all(&rel, "apple,blue")?;
    assert!(got.is_empty());
    rel.close()?;
    Ok(())
}

#[test]
fn wildcard_queries_return_expected_sets() -> anyhow::Result<()> {
    let name = unique_root("wildcard");
    let chvec = round_robin(2);
    let mut rel = Relation::create(&name, 2, 1, 0, &chvec, RelationConfig::default())?;
    rel.insert("apple,red")?;
    rel.insert("apple,blue")?;
    rel.insert("pear,red")?;

    let mut by_first = query_all(&rel, "apple,?")?;
    by_first.sort();
    assert_eq!(by_first, vec!["apple,blue".to_string(), "apple,red".to_string()]);

    let mut by_second = query_all(&rel, "?,red")?;
    by_second.sort();
    assert_eq!(by_second, vec!["apple,red".to_string(), "pear,red".to_string()]);

    let mut all = query_all(&rel, "?,?")?;
    all.sort();
    assert_eq!(
        all,
        vec![
            "apple,blue".to_string(),
            "apple,red".to_string(),
            "pear,red".to_string(),
        ]
    );

    rel.close()?;
    Ok(())
}

#[test]
fn split_trigger_preserves_every_tuple() -> anyhow::Result<()> {
    let name = unique_root("split-trigger");
    let chvec = round_robin(2);
    let cfg = RelationConfig::default(); // split_threshold(2) == floor(1024/20) == 51
    assert_eq!(cfg.split_threshold(2), 51);

    let mut rel = Relation::create(&name, 2, 1, 0, &chvec, cfg)?;
    let tuples: Vec<String> = (0..51).map(|i| format!("k{i},v{i}")).collect();
    for t in &tuples {
        rel.insert(t)?;
    }

    assert_eq!(rel.ntuples(), 51);
    assert!(rel.npages() >= 2, "a split must have occurred by the 51st insert");
    assert!(rel.splitp() > 0 || rel.depth() > 0);

    for t in &tuples {
        let parts: Vec<&str> = t.split(',').collect();
        let got = query_all(&rel, t)?;
        assert_eq!(got, vec![t.clone()], "tuple {parts:?} must remain retrievable after split");
    }

    rel.close()?;
    Ok(())
}

#[test]
fn overflow_chain_keeps_everything_retrievable() -> anyhow::Result<()> {
    let name = unique_root("overflow-chain");
    // Every chvec entry draws from attribute 0, bit 0: with depth=0 every
    // tuple still maps to the single bucket (getLower(_, 0) == 0 regardless),
    // so this only needs depth=0 to force collisions, but using a uniform
    // choice vector keeps the intent explicit even after a hypothetical split.
    let chvec = vec!["0:0"; malhf::consts::MAXCHVEC].join(",");
    let mut cfg = RelationConfig::default();
    cfg.page_size = 64;
    cfg.split_threshold_numerator = 1_000_000; // disable splitting for this test

    let mut rel = Relation::create(&name, 2, 1, 0, &chvec, cfg)?;
    let tuples: Vec<String> = (0..80).map(|i| format!("k{i:03},v{i:03}")).collect();
    for t in &tuples {
        rel.insert(t)?;
    }
    assert_eq!(rel.ntuples(), tuples.len() as u64);
    assert_eq!(rel.npages(), 1, "splitting was disabled; still a single bucket");

    let mut all = query_all(&rel, "?,?")?;
    all.sort();
    let mut expected = tuples.clone();
    expected.sort();
    assert_eq!(all, expected);

    let stats = rel.stats()?;
    assert_eq!(stats.buckets.len(), 1);
    assert!(
        stats.buckets[0].len() > 1,
        "expected at least one overflow page beyond the primary"
    );

    rel.close()?;
    Ok(())
}

#[test]
fn malformed_and_oversized_inserts_are_rejected() -> anyhow::Result<()> {
    let name = unique_root("rejects");
    let chvec = round_robin(2);
    let mut cfg = RelationConfig::default();
    cfg.page_size = 32;
    let mut rel = Relation::create(&name, 2, 1, 0, &chvec, cfg)?;

    assert!(rel.insert("apple").is_err()); // wrong attribute count
    assert!(rel
        .insert(&format!("{},{}", "x".repeat(64), "y"))
        .is_err()); // exceeds page capacity
    assert_eq!(rel.ntuples(), 0);

    rel.close()?;
    Ok(())
}
