use cosmian_bloom_filter_kem::{
    BloomFilterKem, KemConfig, PrivateKey, PuncturableKem, PublicKey, SHARED_SECRET_LENGTH,
};
use criterion::{criterion_group, criterion_main, BatchSize, Criterion};

/// Key sizes: (capacity, false-positive probability).
#[cfg(not(feature = "full_bench"))]
const KEY_SIZES: [(u64, f64); 1] = [(256, 0.01)];

#[cfg(feature = "full_bench")]
const KEY_SIZES: [(u64, f64); 3] = [(256, 0.01), (1024, 0.001), (4096, 0.001)];

fn keygen(
    kem: &BloomFilterKem,
    config: &KemConfig,
) -> (
    PrivateKey<SHARED_SECRET_LENGTH>,
    PublicKey<SHARED_SECRET_LENGTH>,
) {
    kem.keygen(config).expect("cannot generate keys")
}

fn bench_keygen(c: &mut Criterion) {
    let kem = BloomFilterKem::new().expect("cannot acquire the pairing engine");

    let mut group = c.benchmark_group("Key generation");
    for (capacity, p) in KEY_SIZES {
        let config = KemConfig::new(capacity, p);
        let params = config.parameters().expect("invalid parameters");
        group.bench_function(
            &format!(
                "{capacity} punctures, {} slots",
                params.bitset_size()
            ),
            |b| b.iter(|| keygen(&kem, &config)),
        );
    }
}

fn bench_encapsulation(c: &mut Criterion) {
    let kem = BloomFilterKem::new().expect("cannot acquire the pairing engine");

    let mut group = c.benchmark_group("Encapsulation");
    for (capacity, p) in KEY_SIZES {
        let config = KemConfig::new(capacity, p);
        let (_, pk) = keygen(&kem, &config);
        group.bench_function(
            &format!("{} hash functions", pk.params().hash_count()),
            |b| b.iter(|| kem.encaps(&pk).expect("cannot encapsulate")),
        );
    }
}

fn bench_decapsulation(c: &mut Criterion) {
    let kem = BloomFilterKem::new().expect("cannot acquire the pairing engine");

    let mut group = c.benchmark_group("Decapsulation");
    for (capacity, p) in KEY_SIZES {
        let config = KemConfig::new(capacity, p);
        let (sk, pk) = keygen(&kem, &config);
        let (_, ct) = kem.encaps(&pk).expect("cannot encapsulate");
        group.bench_function(
            &format!("{} hash functions", pk.params().hash_count()),
            |b| b.iter(|| kem.decaps(&sk, &ct).expect("cannot decapsulate")),
        );
    }
}

fn bench_puncture(c: &mut Criterion) {
    let kem = BloomFilterKem::new().expect("cannot acquire the pairing engine");
    let (capacity, p) = KEY_SIZES[0];
    let (sk, pk) = keygen(&kem, &KemConfig::new(capacity, p));

    c.bench_function("Puncture", |b| {
        b.iter_batched(
            || kem.encaps(&pk).expect("cannot encapsulate").1,
            |ct| kem.puncture(&sk, &ct),
            BatchSize::SmallInput,
        );
    });
}

#[cfg(feature = "full_bench")]
fn bench_serialization(c: &mut Criterion) {
    use cosmian_crypto_core::bytes_ser_de::Serializable;

    let kem = BloomFilterKem::new().expect("cannot acquire the pairing engine");
    let (capacity, p) = KEY_SIZES[0];
    let (sk, pk) = keygen(&kem, &KemConfig::new(capacity, p));

    let mut group = c.benchmark_group("Key serialization");
    group.bench_function("private key", |b| {
        b.iter(|| sk.serialize().expect("cannot serialize the private key"));
    });
    group.bench_function("public key", |b| {
        b.iter(|| pk.serialize().expect("cannot serialize the public key"));
    });
    let bytes = sk.serialize().expect("cannot serialize the private key");
    group.bench_function("private key deserialization", |b| {
        b.iter(|| {
            PrivateKey::<SHARED_SECRET_LENGTH>::deserialize(&bytes)
                .expect("cannot deserialize the private key")
        });
    });
}

criterion_group!(
    name = benches;
    config = Criterion::default().sample_size(10);
    targets =
        bench_keygen,
        bench_encapsulation,
        bench_decapsulation,
        bench_puncture
);

#[cfg(feature = "full_bench")]
criterion_group!(
    name = benches_serialization;
    config = Criterion::default().sample_size(100);
    targets = bench_serialization,
);

#[cfg(feature = "full_bench")]
criterion_main!(benches, benches_serialization);

#[cfg(not(feature = "full_bench"))]
criterion_main!(benches);
