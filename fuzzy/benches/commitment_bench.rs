use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use soundpair_fuzzy::{CodeParams, FuzzyCommitment, ReedSolomon, SymbolCodec};

fn random_bits(n: usize, rng: &mut StdRng) -> Vec<u16> {
    (0..n).map(|_| rng.gen_range(0..2u16)).collect()
}

fn with_errors(bits: &[u16], errors: usize) -> Vec<u16> {
    let mut out = bits.to_vec();
    for i in (0..errors).map(|k| k * bits.len() / errors.max(1)) {
        out[i] ^= 1;
    }
    out
}

fn bench_rs(c: &mut Criterion) {
    let rs = ReedSolomon::new(CodeParams::default()).unwrap();
    let mut rng = StdRng::seed_from_u64(1);
    let message: Vec<u16> = (0..152).map(|_| rng.gen_range(0..1024u16)).collect();
    let codeword = rs.encode(&message).unwrap();

    c.bench_function("rs_encode_512_152", |b| {
        b.iter(|| {
            let _ = black_box(rs.encode(black_box(&message)));
        });
    });

    let mut group = c.benchmark_group("rs_decode_512_152");
    for errors in [0usize, 60, 180] {
        let mut received = codeword.clone();
        for i in (0..errors).map(|k| k * 512 / errors.max(1)) {
            received[i] ^= 0x155;
        }
        group.bench_function(format!("{errors}_errors"), |b| {
            b.iter(|| {
                let _ = black_box(rs.decode(black_box(&received)));
            });
        });
    }
    group.finish();
}

fn bench_commitment(c: &mut Criterion) {
    let fuzzy = FuzzyCommitment::new(CodeParams::default()).unwrap();
    let mut rng = StdRng::seed_from_u64(2);
    let secret = random_bits(512, &mut rng);
    let commitment = fuzzy.commit(&secret).unwrap();
    let noisy = with_errors(&secret, 100);

    c.bench_function("commit_512", |b| {
        b.iter(|| {
            let _ = black_box(fuzzy.commit(black_box(&secret)));
        });
    });

    c.bench_function("decommit_512_100_errors", |b| {
        b.iter(|| {
            let _ = black_box(fuzzy.decommit(&commitment.blob, black_box(&noisy)));
        });
    });
}

criterion_group!(benches, bench_rs, bench_commitment);
criterion_main!(benches);
