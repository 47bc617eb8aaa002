//! Benchmarks for visibility traversal.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use region_digraph::digraph::RegionDigraph;
use region_digraph::filter::RegionFilter;
use region_digraph::query::{CapabilityCandidate, CapabilityVisibility};
use region_digraph::region::ModuleId;

/// `regions` regions in a ring, each also importing from the next-but-one,
/// with `per_region` modules each. Ring edges admit even-numbered exports.
fn ring(regions: u64, per_region: u64) -> RegionDigraph {
    let mut g = RegionDigraph::new();
    for r in 0..regions {
        let name = format!("r{r}");
        g.create_region(&name).unwrap();
        for m in 0..per_region {
            g.add_module(&name, ModuleId::new(1 + r * per_region + m)).unwrap();
        }
    }
    let even = RegionFilter::builder()
        .allow("export", "(|(name=e0)(name=e2)(name=e4)(name=e6)(name=e8))")
        .unwrap()
        .build();
    for r in 0..regions {
        let tail = format!("r{r}");
        g.connect(&tail, even.clone(), &format!("r{}", (r + 1) % regions))
            .unwrap();
        if regions > 2 {
            g.connect(&tail, RegionFilter::allow_everything(), &format!("r{}", (r + 2) % regions))
                .unwrap();
        }
    }
    g
}

fn candidates(regions: u64, per_region: u64) -> Vec<CapabilityCandidate> {
    (1..=regions * per_region)
        .map(|m| {
            CapabilityCandidate::new(m, "export").with_attribute("name", format!("e{}", m % 10))
        })
        .collect()
}

fn bench_ring(c: &mut Criterion) {
    for regions in [4u64, 8] {
        let g = ring(regions, 10);
        let all = candidates(regions, 10);
        let caps = CapabilityVisibility::new(&g);
        c.bench_function(&format!("visible_ring_{regions}"), |bench| {
            bench.iter(|| black_box(caps.visible(ModuleId::new(1), &all)))
        });
    }
}

fn bench_many_requesters(c: &mut Criterion) {
    let g = ring(8, 10);
    let all = candidates(8, 10);
    let requesters: Vec<ModuleId> = (1..=80).map(ModuleId::new).collect();
    let caps = CapabilityVisibility::new(&g);
    c.bench_function("visible_for_many_80", |bench| {
        bench.iter(|| black_box(caps.visible_for_many(&requesters, &all)))
    });
}

criterion_group!(benches, bench_ring, bench_many_requesters);
criterion_main!(benches);
