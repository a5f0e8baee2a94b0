use proptest::prelude::*;
use robo_core::cyclic::{
    complementary_midpoint, cyclic_average, cyclic_contains, cyclic_delta, cyclic_distance,
    wrap_unit,
};

fn unit() -> impl Strategy<Value = f64> {
    0.0f64..1.0
}

proptest! {
    #[test]
    fn distance_is_symmetric_and_bounded(a in unit(), b in unit()) {
        let d = cyclic_distance(a, b);
        prop_assert_eq!(d, cyclic_distance(b, a));
        prop_assert!((0.0..=0.5).contains(&d), "d = {}", d);
    }

    #[test]
    fn endpoints_lie_on_their_arc(a in unit(), b in unit()) {
        prop_assume!(a != b);
        prop_assert!(cyclic_contains(a, a, b));
        prop_assert!(cyclic_contains(b, a, b));
    }

    #[test]
    fn complementary_midpoint_is_outside(a in unit(), b in unit()) {
        // the short arc is only well defined away from half a turn
        prop_assume!(cyclic_distance(a, b) < 0.49);
        let m = complementary_midpoint(a, b);
        prop_assert!(!cyclic_contains(m, a, b), "a={} b={} m={}", a, b, m);
    }

    #[test]
    fn average_is_on_the_arc_and_equidistant(a in unit(), b in unit()) {
        prop_assume!(cyclic_distance(a, b) < 0.49);
        let m = cyclic_average(a, b);
        prop_assert!((0.0..1.0).contains(&m));
        prop_assert!(cyclic_contains(m, a, b));
        prop_assert!((cyclic_distance(m, a) - cyclic_distance(m, b)).abs() < 1e-9);
    }

    #[test]
    fn delta_steps_from_one_to_the_other(a in unit(), b in unit()) {
        let d = cyclic_delta(a, b);
        prop_assert!(d.abs() <= 0.5 + 1e-12);
        prop_assert!(cyclic_distance(wrap_unit(a + d), b) < 1e-9);
    }

    #[test]
    fn wrap_lands_in_unit_interval(x in -1.0e6f64..1.0e6) {
        let w = wrap_unit(x);
        prop_assert!((0.0..1.0).contains(&w));
    }
}
