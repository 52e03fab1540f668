//! Fixed-width unsigned integers wider than a machine word
//!
//! Arithmetic wraps modulo `2^bits`, which is exactly the reduction FNV
//! needs at every width.

/// Unsigned integer of `bits` bits stored as little-endian 64-bit limbs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WideUint {
    limbs: Vec<u64>,
    bits: u32,
}

impl WideUint {
    /// Zero at the given width. A zero-bit value can only ever hold 0.
    pub fn zero(bits: u32) -> Self {
        Self {
            limbs: vec![0; limb_count(bits)],
            bits,
        }
    }

    /// Build from little-endian limbs, truncating to `bits`
    pub fn from_limbs(limbs: &[u64], bits: u32) -> Self {
        let mut value = Self::zero(bits);
        for (dst, src) in value.limbs.iter_mut().zip(limbs) {
            *dst = *src;
        }
        value.truncate();
        value
    }

    /// Build from big-endian bytes, truncating to `bits`
    pub fn from_be_bytes(bytes: &[u8], bits: u32) -> Self {
        let mut value = Self::zero(bits);
        for (i, &byte) in bytes.iter().rev().enumerate() {
            let limb = i / 8;
            if limb >= value.limbs.len() {
                break;
            }
            value.limbs[limb] |= u64::from(byte) << ((i % 8) * 8);
        }
        value.truncate();
        value
    }

    /// Width in bits
    pub fn bits(&self) -> u32 {
        self.bits
    }

    /// Little-endian limbs
    pub fn limbs(&self) -> &[u64] {
        &self.limbs
    }

    /// XOR a byte into the least significant position
    pub fn xor_low_byte(&mut self, byte: u8) {
        if let Some(low) = self.limbs.first_mut() {
            *low ^= u64::from(byte);
            if self.bits < 8 {
                self.truncate();
            }
        }
    }

    /// `self = (self * rhs) mod 2^bits`
    pub fn wrapping_mul_assign(&mut self, rhs: &WideUint) {
        let n = self.limbs.len();
        let mut product = vec![0u64; n];

        for (i, &a) in self.limbs.iter().enumerate() {
            if a == 0 {
                continue;
            }
            let mut carry: u128 = 0;
            for j in 0..n - i {
                let b = rhs.limbs.get(j).copied().unwrap_or(0);
                let t = u128::from(product[i + j]) + u128::from(a) * u128::from(b) + carry;
                product[i + j] = t as u64;
                carry = t >> 64;
            }
        }

        self.limbs = product;
        self.truncate();
    }

    /// Big-endian bytes, left-padded with zeros to exactly `bits / 8` bytes
    pub fn to_be_bytes(&self) -> Vec<u8> {
        let len = (self.bits / 8) as usize;
        let mut out = Vec::with_capacity(self.limbs.len() * 8);
        for limb in self.limbs.iter().rev() {
            out.extend_from_slice(&limb.to_be_bytes());
        }
        out.split_off(out.len() - len)
    }

    fn truncate(&mut self) {
        let spare = self.limbs.len() as u32 * 64 - self.bits;
        if spare > 0 {
            if let Some(top) = self.limbs.last_mut() {
                *top &= u64::MAX >> spare;
            }
        }
    }
}

fn limb_count(bits: u32) -> usize {
    ((bits + 63) / 64) as usize
}
