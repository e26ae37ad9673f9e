//! Guards the opcode table against accidental edits.

#[cfg(test)]
mod tests {
    /// Fingerprint of every table entry. Assembled programs depend on each
    /// set, opcode, mnemonic and operand shape, so a change here must be
    /// deliberate.
    const EXPECTED_ISA_HASH: u64 = 0x7e11cf00dfa9d3c6;

    /// 64-bit FNV-1a accumulator.
    struct Fingerprint(u64);

    impl Fingerprint {
        const OFFSET: u64 = 0xcbf29ce484222325;
        const PRIME: u64 = 0x100000001b3;

        fn new() -> Self {
            Fingerprint(Self::OFFSET)
        }

        fn feed(&mut self, bytes: &[u8]) -> &mut Self {
            for byte in bytes {
                self.0 ^= *byte as u64;
                self.0 = self.0.wrapping_mul(Self::PRIME);
            }
            self
        }
    }

    macro_rules! fingerprint_table {
        (
            $( $(#[$doc:meta])* $name:ident = $set:ident : $opcode:literal, $mnemonic:literal => [ $( $field:ident : $kind:ident ),* $(,)? ] ),* $(,)?
        ) => {{
            let mut print = Fingerprint::new();
            $(
                print
                    .feed(stringify!($set).as_bytes())
                    .feed(&[$opcode])
                    .feed(stringify!($name).as_bytes())
                    .feed($mnemonic.as_bytes());
                $( print.feed(stringify!($kind).as_bytes()); )*
                print.feed(b"\n");
            )*
            print.0
        }};
    }

    fn current_isa_hash() -> u64 {
        crate::for_each_instruction!(fingerprint_table)
    }

    #[test]
    #[ignore]
    fn print_isa_hash() {
        println!("ISA_HASH=0x{:016x}", current_isa_hash());
    }

    #[test]
    fn isa_hash_unchanged() {
        assert_eq!(current_isa_hash(), EXPECTED_ISA_HASH);
    }
}
