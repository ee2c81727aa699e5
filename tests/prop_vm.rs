use evm384::bigint384::{self, Limbs, BYTES};
use evm384::{analyze, execute, InMemoryHost, Message, Revision, StatusCode};
use num_bigint::BigUint;
use proptest::prelude::*;

fn big(bytes: &[u8]) -> BigUint {
    BigUint::from_bytes_be(bytes)
}

fn word(v: &BigUint) -> [u8; 32] {
    let mut out = [0u8; 32];
    let b = v.to_bytes_be();
    let b = &b[b.len().saturating_sub(32)..];
    out[32 - b.len()..].copy_from_slice(b);
    out
}

/// PUSH32 c PUSH32 b PUSH32 a <op> and return the result word.
fn eval(op: u8, args: &[[u8; 32]]) -> [u8; 32] {
    let mut code = Vec::new();
    for a in args.iter().rev() {
        code.push(0x7f);
        code.extend_from_slice(a);
    }
    code.push(op);
    code.extend_from_slice(&[0x60, 0x00, 0x52, 0x60, 0x20, 0x60, 0x00, 0xf3]);
    let msg = Message { gas: 1_000_000, ..Default::default() };
    let res = execute(&mut InMemoryHost::default(), Revision::Istanbul, msg, &code);
    assert_eq!(res.status, StatusCode::Success);
    let mut out = [0u8; 32];
    out.copy_from_slice(res.output());
    out
}

fn limbs(v: &BigUint) -> Limbs {
    let mut le = v.to_bytes_le();
    le.resize(BYTES, 0);
    bigint384::load_limbs(&le)
}

fn from_limbs(l: &Limbs) -> BigUint {
    let mut le = [0u8; BYTES];
    bigint384::store_limbs(&mut le, l);
    BigUint::from_bytes_le(&le)
}

/// `-m^-1 mod 2^64` by Newton iteration; `m0` must be odd.
fn mont_inv(m0: u64) -> u64 {
    let mut inv: u64 = 1;
    for _ in 0..6 {
        inv = inv.wrapping_mul(2u64.wrapping_sub(m0.wrapping_mul(inv)));
    }
    inv.wrapping_neg()
}

fn modulus_384() -> impl Strategy<Value = BigUint> {
    prop::collection::vec(any::<u8>(), BYTES).prop_map(|mut b| {
        b[0] |= 0x80;
        b[BYTES - 1] |= 1;
        big(&b)
    })
}

fn operand_384() -> impl Strategy<Value = BigUint> {
    prop::collection::vec(any::<u8>(), BYTES).prop_map(|b| big(&b))
}

proptest! {
    #[test]
    fn arithmetic_wraps_like_bigint(a in any::<[u8; 32]>(), b in any::<[u8; 32]>()) {
        let modulus = BigUint::from(1u8) << 256;
        let (x, y) = (big(&a), big(&b));
        prop_assert_eq!(eval(0x01, &[a, b]), word(&((&x + &y) % &modulus)));
        prop_assert_eq!(eval(0x02, &[a, b]), word(&((&x * &y) % &modulus)));
        prop_assert_eq!(eval(0x03, &[a, b]), word(&((&x + &modulus - &y) % &modulus)));
        let div = if y == BigUint::default() { BigUint::default() } else { &x / &y };
        prop_assert_eq!(eval(0x04, &[a, b]), word(&div));
    }

    #[test]
    fn modular_ops_match_bigint(a in any::<[u8; 32]>(), b in any::<[u8; 32]>(), n in any::<[u8; 32]>()) {
        let (x, y, m) = (big(&a), big(&b), big(&n));
        let zero = BigUint::default();
        let addmod = if m == zero { zero.clone() } else { (&x + &y) % &m };
        let mulmod = if m == zero { zero.clone() } else { (&x * &y) % &m };
        prop_assert_eq!(eval(0x08, &[a, b, n]), word(&addmod));
        prop_assert_eq!(eval(0x09, &[a, b, n]), word(&mulmod));
    }

    #[test]
    fn evm384_add_sub(m in modulus_384(), a in operand_384(), b in operand_384()) {
        let (x, y) = (&a % &m, &b % &m);
        let sum = bigint384::addmod384(&limbs(&x), &limbs(&y), &limbs(&m));
        prop_assert_eq!(from_limbs(&sum), (&x + &y) % &m);
        let diff = bigint384::submod384(&limbs(&x), &limbs(&y), &limbs(&m));
        prop_assert_eq!(from_limbs(&diff), (&x + &m - &y) % &m);
    }

    #[test]
    fn evm384_montgomery(m in modulus_384(), a in operand_384(), b in operand_384()) {
        let (x, y) = (&a % &m, &b % &m);
        let ml = limbs(&m);
        let r = from_limbs(&bigint384::mulmodmont384(&limbs(&x), &limbs(&y), &ml, mont_inv(ml[0])));
        prop_assert!(r < m);
        prop_assert_eq!((r << 384u32) % &m, (&x * &y) % &m);
    }

    #[test]
    fn jumpdests_are_real(code in prop::collection::vec(any::<u8>(), 0..256)) {
        let a = analyze(Revision::Istanbul, &code);
        let mut in_push_data = vec![false; code.len()];
        let mut decoded = 0;
        let mut i = 0;
        while i < code.len() {
            if code[i] != 0x5b {
                decoded += 1;
            }
            if (0x60..=0x7f).contains(&code[i]) {
                let n = (code[i] - 0x5f) as usize;
                for d in in_push_data.iter_mut().skip(i + 1).take(n) {
                    *d = true;
                }
                i += n;
            }
            i += 1;
        }
        let expected: Vec<usize> =
            (0..code.len()).filter(|&i| code[i] == 0x5b && !in_push_data[i]).collect();
        prop_assert_eq!(&a.jumpdest_offsets, &expected);
        let body = a.instrs.iter().filter(|i| i.block().is_none() && i.code_offset.is_some()).count();
        prop_assert_eq!(body, decoded);
        for (off, idx) in a.jumpdest_offsets.iter().zip(&a.jumpdest_targets) {
            prop_assert!(a.instrs[*idx].block().is_some());
            prop_assert_eq!(a.instrs[*idx].code_offset, Some(*off));
        }
    }

    #[test]
    fn push_only_programs_pay_three_per_push(sizes in prop::collection::vec(1usize..=32, 0..64), budget in 10_000i64..1_000_000) {
        let mut code = Vec::new();
        for &n in &sizes {
            code.push(0x5f + n as u8);
            code.extend(std::iter::repeat(0xee).take(n));
        }
        code.push(0x00);
        let msg = Message { gas: budget, ..Default::default() };
        let res = execute(&mut InMemoryHost::default(), Revision::Frontier, msg, &code);
        prop_assert_eq!(res.status, StatusCode::Success);
        prop_assert_eq!(res.gas_left, budget - 3 * sizes.len() as i64);
    }

    #[test]
    fn lone_undefined_opcode_burns_everything(budget in 0i64..10_000_000) {
        let msg = Message { gas: budget, ..Default::default() };
        let res = execute(&mut InMemoryHost::default(), Revision::Istanbul, msg, &[0x0c]);
        prop_assert_eq!(res.status, StatusCode::UndefinedInstruction);
        prop_assert_eq!(res.gas_left, 0);
    }

    #[test]
    fn random_code_never_mints_gas(code in prop::collection::vec(any::<u8>(), 0..128)) {
        let gas = 100_000;
        let msg = Message { gas, ..Default::default() };
        let res = execute(&mut InMemoryHost::default(), Revision::Istanbul, msg, &code);
        prop_assert!(res.gas_left >= 0 && res.gas_left <= gas);
        if !res.status.refunds_gas() {
            prop_assert_eq!(res.gas_left, 0);
        }
    }
}

#[test]
fn mont_inv_of_bls_modulus() {
    assert_eq!(mont_inv(0xb9fe_ffff_ffff_aaab), 0x89f3_fffc_fffc_fffd);
}
