//! Property tests over the public API.

use proptest::prelude::*;

use veridet_core::audit::AuditLog;
use veridet_core::certified::CertifiedArithmetic;
use veridet_core::numeric::FixedPoint;

/// Raw values small enough that a product of two never overflows.
fn small() -> impl Strategy<Value = FixedPoint> {
    (0u128..=1_000_000_000_000_000_000_000_000u128).prop_map(FixedPoint::from_raw)
}

proptest! {
    #[test]
    fn decimal_text_round_trips(raw in any::<u128>()) {
        let x = FixedPoint::from_raw(raw);
        let back: FixedPoint = x.to_decimal_string().parse().unwrap();
        prop_assert_eq!(back.raw(), raw);
    }

    #[test]
    fn add_then_sub_is_identity(a in small(), b in small()) {
        let mut log = AuditLog::new();
        let mut engine = CertifiedArithmetic::new(&mut log);
        let sum = engine.add(a, b).unwrap();
        prop_assert_eq!(engine.sub(sum, b).unwrap(), a);
        prop_assert_eq!(engine.log().len(), 2);
    }

    #[test]
    fn identical_calls_identical_digests(a in small(), b in small()) {
        let run = || {
            let mut log = AuditLog::new();
            let mut engine = CertifiedArithmetic::new(&mut log);
            let _ = engine.mul(a, b);
            let _ = engine.div(a, b);
            let _ = engine.sqrt(a);
            log.log_hash()
        };
        prop_assert_eq!(run(), run());
    }

    #[test]
    fn sqrt_is_floor_root(x in (0u128..=100_000_000_000_000_000_000u128).prop_map(FixedPoint::from_raw)) {
        let mut log = AuditLog::new();
        let root = CertifiedArithmetic::new(&mut log).sqrt(x).unwrap();
        // root^2 <= x < (root + 1 ulp)^2, compared at double scale.
        let r = root.raw();
        let target = x.raw() * 1_000_000_000_000_000_000;
        prop_assert!(r * r <= target);
        prop_assert!((r + 1) * (r + 1) > target);
    }
}
