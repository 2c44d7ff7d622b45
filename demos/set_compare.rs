use rand::{Rng,SeedableRng,rngs::StdRng};

use fixed_set::{Binary,Config,FixedSet,OuterPolicy};
use std::collections::BTreeSet;

fn diff(func: &'static str, x: i32, set: &FixedSet<i32>, ctr: &BTreeSet<i32>) {
    println!("FixedSet: {:?}",set);
    println!("BTreeSet: {:?}",ctr);
    panic!("Sets differ in {} for {}",func,x);
}

fn main() -> Result<(),Box<dyn std::error::Error>> {
    env_logger::init();

    let seed = std::env::args().nth(1).and_then(|s| s.parse().ok()).unwrap_or(667);
    let mut rng = StdRng::seed_from_u64(seed);

    let tm = std::time::Instant::now();
    let dur = std::time::Duration::new(60,0);
    let mut round = 0;

    while tm.elapsed() < dur {
        round += 1;
        let cnt = rng.gen_range(0 .. 100_000);
        let mut ctr = BTreeSet::new();
        while ctr.len() < cnt {
            ctr.insert(rng.gen::<i32>());
        }
        let keys: Vec<i32> = ctr.iter().copied().collect();

        let policy = match round % 2 {
            0 => OuterPolicy::CollisionBound,
            _ => OuterPolicy::SquareSumBound,
        };
        let cfg = Config::default().with_outer_policy(policy).with_seed(rng.gen());
        let set = FixedSet::with_config(&keys,&cfg)?;

        for k in &keys {
            if !set.contains(*k) { diff("present",*k,&set,&ctr); }
        }
        for _ in 0 .. 1_000_000 {
            let x: i32 = rng.gen();
            if set.contains(x) != ctr.contains(&x) { diff("contains",x,&set,&ctr); }
        }

        let mut buf = Vec::new();
        set.into_writer(&mut buf)?;
        let back: FixedSet<i32> = FixedSet::from_reader(&buf[..])?;
        for k in &keys {
            if !back.contains(*k) { diff("reloaded",*k,&back,&ctr); }
        }

        println!("Round {} ({:?}), {} bytes in memory, {} on disk",round,policy,set.memory(),buf.len());
        for s in set.statistics() {
            println!("  {}",s);
        }
    }
    Ok(())
}
