use criterion::{Criterion, black_box, criterion_group, criterion_main};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use std::time::Duration;
use zk_rsa::constants::KEY_BITS;
use zk_rsa::groth16::{prove, setup_keys, verify};
use zk_rsa::keys::{derive_public_key, sample_private_key_with_rng, sign};

fn bench_prove_verify(c: &mut Criterion) {
    let mut rng = ChaCha20Rng::seed_from_u64(0);
    let (pk, vk) = setup_keys(&mut rng).unwrap();

    let sk = sample_private_key_with_rng(&mut rng, KEY_BITS).unwrap();
    let public_key = derive_public_key(&sk);
    let message = [0u8];
    let signature = sign(&sk, &message).unwrap();

    let mut group = c.benchmark_group("rsa_2048_1024");
    group.sample_size(10);
    group.measurement_time(Duration::from_secs(60));

    group.bench_function("prove", |b| {
        b.iter(|| black_box(prove(&pk, &public_key, &message, &signature).unwrap()))
    });

    let proof = prove(&pk, &public_key, &message, &signature).unwrap();
    group.bench_function("verify", |b| b.iter(|| black_box(verify(&vk, &proof))));

    group.finish();
}

criterion_group!(benches, bench_prove_verify);
criterion_main!(benches);
