// Replay packet and signature benchmarks.
//
// Covers keypair derivation on both backends, packet signing, and chain
// validation against a predecessor.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use veridet_core::audit::AuditLog;
use veridet_core::config::{ProviderConfig, SignatureBackend};
use veridet_core::crypto::{create_provider, SignatureAlgorithm};
use veridet_core::packet::{PacketFields, ReplayPacket, ValidationContext};

const SEED: &[u8] = b"benchmark-seed-0123456789";

fn bench_keygen(c: &mut Criterion) {
    let mut group = c.benchmark_group("keygen");
    for backend in [SignatureBackend::Mock, SignatureBackend::Lattice] {
        for algorithm in SignatureAlgorithm::ALL {
            let id = BenchmarkId::new(backend.as_str(), algorithm.as_str());
            group.bench_function(id, |b| {
                let mut provider = create_provider(&ProviderConfig { backend });
                b.iter(|| provider.generate_keypair(SEED, algorithm));
            });
        }
    }
    group.finish();
}

fn bench_sign_and_validate(c: &mut Criterion) {
    let algorithm = SignatureAlgorithm::MlDsa65;
    for backend in [SignatureBackend::Mock, SignatureBackend::Lattice] {
        let mut provider = create_provider(&ProviderConfig { backend });
        let key = provider
            .generate_keypair(SEED, algorithm)
            .expect("keygen");
        let mut log = AuditLog::new();

        let mut genesis = ReplayPacket::new(PacketFields {
            timestamp: 1,
            sequence: 0,
            seed: "genesis".into(),
            ..PacketFields::default()
        })
        .expect("genesis");
        genesis
            .sign(provider.as_mut(), key.private_key(), algorithm, &mut log)
            .expect("sign genesis");

        let next_fields = PacketFields {
            timestamp: 2,
            sequence: 1,
            seed: "next".into(),
            metadata: None,
            previous_hash: Some(genesis.hash()),
        };

        c.bench_function(&format!("packet/{}/sign", backend.as_str()), |b| {
            b.iter(|| {
                let mut packet = ReplayPacket::new(next_fields.clone()).expect("packet");
                packet
                    .sign(provider.as_mut(), key.private_key(), algorithm, &mut log)
                    .expect("sign");
                packet
            });
        });

        let mut next = ReplayPacket::new(next_fields.clone()).expect("packet");
        next.sign(provider.as_mut(), key.private_key(), algorithm, &mut log)
            .expect("sign");

        c.bench_function(&format!("packet/{}/validate", backend.as_str()), |b| {
            b.iter(|| {
                let ctx = ValidationContext::new()
                    .signed_by(provider.as_mut(), key.public_key(), algorithm)
                    .after(&genesis);
                next.is_valid(ctx, &mut log)
            });
        });
    }
}

criterion_group!(benches, bench_keygen, bench_sign_and_validate);
criterion_main!(benches);
