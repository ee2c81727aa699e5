//! 384-bit modular arithmetic over six little-endian 64-bit limbs.
//!
//! Operands are expected to be reduced (`x, y < m`). Carries and borrows are
//! propagated through every limb; nothing wraps silently.

pub const LIMBS: usize = 6;
/// Width of one operand in bytes.
pub const BYTES: usize = LIMBS * 8;

pub type Limbs = [u64; LIMBS];

#[inline]
fn adc(a: u64, b: u64, carry: u64) -> (u64, u64) {
    let t = a as u128 + b as u128 + carry as u128;
    (t as u64, (t >> 64) as u64)
}

#[inline]
fn sbb(a: u64, b: u64, borrow: u64) -> (u64, u64) {
    let t = (a as u128).wrapping_sub(b as u128 + borrow as u128);
    (t as u64, (t >> 127) as u64)
}

/// `a + b * c + carry`, returned as (low, high).
#[inline]
fn mac(a: u64, b: u64, c: u64, carry: u64) -> (u64, u64) {
    let t = a as u128 + (b as u128) * (c as u128) + carry as u128;
    (t as u64, (t >> 64) as u64)
}

/// `x - m` with the final borrow, over the 7-limb value `(hi, x)`.
fn sub_modulus(x: &Limbs, hi: u64, m: &Limbs) -> (Limbs, bool) {
    let mut out = [0u64; LIMBS];
    let mut borrow = 0;
    for i in 0..LIMBS {
        let (d, b) = sbb(x[i], m[i], borrow);
        out[i] = d;
        borrow = b;
    }
    let (_, borrow) = sbb(hi, 0, borrow);
    (out, borrow != 0)
}

/// `(x + y) mod m`.
pub fn addmod384(x: &Limbs, y: &Limbs, m: &Limbs) -> Limbs {
    let mut sum = [0u64; LIMBS];
    let mut carry = 0;
    for i in 0..LIMBS {
        let (s, c) = adc(x[i], y[i], carry);
        sum[i] = s;
        carry = c;
    }
    match sub_modulus(&sum, carry, m) {
        (reduced, false) => reduced,
        (_, true) => sum,
    }
}

/// `(x - y) mod m`.
pub fn submod384(x: &Limbs, y: &Limbs, m: &Limbs) -> Limbs {
    let mut diff = [0u64; LIMBS];
    let mut borrow = 0;
    for i in 0..LIMBS {
        let (d, b) = sbb(x[i], y[i], borrow);
        diff[i] = d;
        borrow = b;
    }
    if borrow == 0 {
        return diff;
    }
    let mut carry = 0;
    for i in 0..LIMBS {
        let (s, c) = adc(diff[i], m[i], carry);
        diff[i] = s;
        carry = c;
    }
    diff
}

/// Montgomery product `x * y * 2^-384 mod m` (CIOS).
///
/// `inv` is `-m^-1 mod 2^64`; `m` must be odd for the result to be
/// meaningful.
pub fn mulmodmont384(x: &Limbs, y: &Limbs, m: &Limbs, inv: u64) -> Limbs {
    let mut t = [0u64; LIMBS + 2];
    for &yi in y.iter() {
        let mut carry = 0;
        for j in 0..LIMBS {
            let (lo, hi) = mac(t[j], x[j], yi, carry);
            t[j] = lo;
            carry = hi;
        }
        let (s, c) = adc(t[LIMBS], carry, 0);
        t[LIMBS] = s;
        t[LIMBS + 1] = c;

        let k = t[0].wrapping_mul(inv);
        let (_, mut carry) = mac(t[0], k, m[0], 0);
        for j in 1..LIMBS {
            let (lo, hi) = mac(t[j], k, m[j], carry);
            t[j - 1] = lo;
            carry = hi;
        }
        let (s, c) = adc(t[LIMBS], carry, 0);
        t[LIMBS - 1] = s;
        t[LIMBS] = t[LIMBS + 1] + c;
    }

    let mut r = [0u64; LIMBS];
    r.copy_from_slice(&t[..LIMBS]);
    match sub_modulus(&r, t[LIMBS], m) {
        (reduced, false) => reduced,
        (_, true) => r,
    }
}

/// Reads a 48-byte little-endian operand.
pub fn load_limbs(bytes: &[u8]) -> Limbs {
    let mut out = [0u64; LIMBS];
    for (limb, chunk) in out.iter_mut().zip(bytes[..BYTES].chunks_exact(8)) {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(chunk);
        *limb = u64::from_le_bytes(buf);
    }
    out
}

pub fn store_limbs(bytes: &mut [u8], limbs: &Limbs) {
    for (chunk, limb) in bytes[..BYTES].chunks_exact_mut(8).zip(limbs.iter()) {
        chunk.copy_from_slice(&limb.to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_hex(h: &str) -> Limbs {
        load_limbs(&hex::decode(h).unwrap())
    }

    fn to_hex(l: &Limbs) -> String {
        let mut b = [0u8; BYTES];
        store_limbs(&mut b, l);
        hex::encode(b)
    }

    // BLS12-381 base field modulus.
    const P: &str = "abaafffffffffeb9ffff53b1feffab1e24f6b0f6a0d23067bf1285f3844b7764d7ac4b43b6a71b4b9ae67f39ea11011a";
    const P_INV: u64 = 0x89f3_fffc_fffc_fffd;

    #[test]
    fn add_and_sub_vectors() {
        let x = from_hex("2d68c6c3a8b1f5a1077ef949836ddc178987ad09e0723f3d9a4aa95f50661652cb9a677b35e122903028f807272c104a");
        let y = from_hex("f1562b8a749c87046d34a6d1101226508bb99a91982faeac365505dc7d9366404d9808a02531e3e80c82cdbab995821e");
        let m = from_hex("ec1e91ae1c738c60602becdaa2c68049efc48e8efa17054cdfb487bd3ccf137fe7e517dbee90eef07123d231ea794fa5");
        let d = submod384(&x, &y, &m);
        assert_eq!(
            to_hex(&d),
            "3c119b3934156e9d9a495378725bb6c7fdcd12784743919063f5a383d2d2af117e025fdb0fb03fa723a62a4d6d968d2b"
        );
        assert_eq!(addmod384(&d, &y, &m), x);
    }

    #[test]
    fn add_carries_out_of_top_limb() {
        let m = [u64::MAX; LIMBS];
        let mut x = [u64::MAX; LIMBS];
        x[0] -= 1; // m - 1
        let one = {
            let mut o = [0u64; LIMBS];
            o[0] = 1;
            o
        };
        assert_eq!(addmod384(&x, &one, &m), [0u64; LIMBS]);
        // (m - 1) + (m - 1) overflows 384 bits and reduces to m - 2.
        let mut m_minus_two = [u64::MAX; LIMBS];
        m_minus_two[0] -= 2;
        assert_eq!(addmod384(&x, &x, &m), m_minus_two);
    }

    #[test]
    fn sub_borrows_back_modulus() {
        let m = from_hex(P);
        let zero = [0u64; LIMBS];
        let mut one = [0u64; LIMBS];
        one[0] = 1;
        let minus_one = submod384(&zero, &one, &m);
        assert_eq!(addmod384(&minus_one, &one, &m), zero);
    }

    #[test]
    fn montgomery_vector() {
        let x = from_hex("38b4e652e44da7f2370d9e260e27136550a4a3a6d07f5c0c332f8b1224083fd22b902f8911e81818f8c99d5d0b33a612");
        let y = from_hex("7504d90e945de2e8f54ee781cc75f636d85099095aa300165a67036f9b540d6b8f0be21124179c3dd9f73817d92da211");
        let m = from_hex(P);
        let r = mulmodmont384(&x, &y, &m, P_INV);
        assert_eq!(
            to_hex(&r),
            "81d2391a44cb28070c7c084806ff7b049faa77e66b4b7d3f70b76641353a2ac643fe55dd515a336a1b6b9da3a3473905"
        );
    }

    #[test]
    fn montgomery_domain_roundtrip() {
        let x = from_hex("38b4e652e44da7f2370d9e260e27136550a4a3a6d07f5c0c332f8b1224083fd22b902f8911e81818f8c99d5d0b33a612");
        let y = from_hex("7504d90e945de2e8f54ee781cc75f636d85099095aa300165a67036f9b540d6b8f0be21124179c3dd9f73817d92da211");
        let m = from_hex(P);
        let r2 = from_hex("4617341c341fdff4f104d109a6e6760ad5b6954c6c47e58dc0839d93a988eb672d9519b5853e799aaae3ca92e58f9811");
        let mut one = [0u64; LIMBS];
        one[0] = 1;

        let xm = mulmodmont384(&x, &r2, &m, P_INV);
        let ym = mulmodmont384(&y, &r2, &m, P_INV);
        let prod = mulmodmont384(&mulmodmont384(&xm, &ym, &m, P_INV), &one, &m, P_INV);
        assert_eq!(
            to_hex(&prod),
            "3e8200b8f6ca97827fdc721d85010e49e3fe21ec08ac530df1b448f815ccb2a490f7f334cbc2a2aa48bdda2f98ac2912"
        );
    }
}
