//! Program derived addresses (PDAs) and seeded account addresses.
//!
//! A PDA is `SHA-256(seed_0 || ... || seed_n || program_id || "ProgramDerivedAddress")`
//! that is deliberately NOT a valid Ed25519 point, so no private key can ever
//! sign for it. Only the owning program can "sign" via the runtime.

use sha2::{Digest, Sha256};
use sol_keys::Pubkey;
use tracing::{debug, trace};

use crate::error::TxError;

/// Longest allowed single seed.
pub const MAX_SEED_LEN: usize = 32;
/// Most seeds allowed in one derivation, bump seed included.
pub const MAX_SEEDS: usize = 16;
/// Domain separator appended to every PDA preimage.
pub const PDA_MARKER: &[u8; 21] = b"ProgramDerivedAddress";

// ---------------------------------------------------------------------------
// Program derived addresses
// ---------------------------------------------------------------------------

/// Derive the address for exactly these seeds.
///
/// Fails with [`TxError::InvalidSeeds`] if the digest lands on the curve;
/// callers normally get their seeds (bump included) from
/// [`find_program_address`].
pub fn create_program_address(seeds: &[&[u8]], program_id: &Pubkey) -> Result<Pubkey, TxError> {
    check_seeds(seeds, MAX_SEEDS)?;
    let address = hash_seeds(seeds, None, program_id);
    if address.is_on_curve() {
        return Err(TxError::InvalidSeeds);
    }
    Ok(address)
}

/// Search bump seeds 255 down to 0 and return the first off-curve address
/// together with its bump.
///
/// The bump is appended as one extra seed, so at most `MAX_SEEDS - 1` seeds
/// may be supplied. Nothing is cached; every call re-derives.
pub fn find_program_address(
    seeds: &[&[u8]],
    program_id: &Pubkey,
) -> Result<(Pubkey, u8), TxError> {
    check_seeds(seeds, MAX_SEEDS - 1)?;

    for bump in (0u8..=255).rev() {
        let address = hash_seeds(seeds, Some(bump), program_id);
        if !address.is_on_curve() {
            debug!(%program_id, %address, bump, seeds = seeds.len(), "found program address");
            return Ok((address, bump));
        }
        trace!(bump, "candidate program address on curve");
    }

    Err(TxError::NoValidBumpFound)
}

fn check_seeds(seeds: &[&[u8]], max: usize) -> Result<(), TxError> {
    if seeds.len() > max {
        return Err(TxError::TooManySeeds(seeds.len()));
    }
    if let Some((index, seed)) = seeds
        .iter()
        .enumerate()
        .find(|(_, seed)| seed.len() > MAX_SEED_LEN)
    {
        return Err(TxError::InvalidSeedLength {
            index,
            len: seed.len(),
        });
    }
    Ok(())
}

fn hash_seeds(seeds: &[&[u8]], bump: Option<u8>, program_id: &Pubkey) -> Pubkey {
    let mut hasher = Sha256::new();
    for seed in seeds {
        hasher.update(seed);
    }
    if let Some(bump) = bump {
        hasher.update([bump]);
    }
    hasher.update(program_id);
    hasher.update(PDA_MARKER);
    Pubkey::new_from_array(hasher.finalize().into())
}

// ---------------------------------------------------------------------------
// Seeded addresses
// ---------------------------------------------------------------------------

/// `SHA-256(base || seed || owner)`, the address of an account created with
/// `CreateAccountWithSeed`. The result may be on the curve.
pub fn create_with_seed(base: &Pubkey, seed: &str, owner: &Pubkey) -> Result<Pubkey, TxError> {
    if seed.len() > MAX_SEED_LEN {
        return Err(TxError::InvalidSeedLength {
            index: 0,
            len: seed.len(),
        });
    }
    // Would let a seeded address collide with a PDA preimage.
    if owner.as_ref().ends_with(PDA_MARKER) {
        return Err(TxError::IllegalOwner);
    }

    let mut hasher = Sha256::new();
    hasher.update(base);
    hasher.update(seed.as_bytes());
    hasher.update(owner);
    Ok(Pubkey::new_from_array(hasher.finalize().into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upgradeable_loader() -> Pubkey {
        "BPFLoaderUpgradeab1e11111111111111111111111".parse().unwrap()
    }

    fn key(s: &str) -> Pubkey {
        s.parse().unwrap()
    }

    // -- create_program_address ---------------------------------------------

    #[test]
    fn create_program_address_known_vectors() {
        let program_id = upgradeable_loader();
        let seed_key = key("SeedPubey1111111111111111111111111111111111");

        assert_eq!(
            create_program_address(&[b"", &[1]], &program_id).unwrap(),
            key("BwqrghZA2htAcqq8dzP1WDAhTXYTYWj7CHxF5j7TDBAe")
        );
        assert_eq!(
            create_program_address(&["☉".as_bytes(), &[0]], &program_id).unwrap(),
            key("13yWmRpaTR4r5nAktwLqMpRNr28tnVUZw26rTvPSSB19")
        );
        assert_eq!(
            create_program_address(&[b"Talking", b"Squirrels"], &program_id).unwrap(),
            key("2fnQrngrQT4SeLcdToJAD96phoEjNL2man2kfRLCASVk")
        );
        assert_eq!(
            create_program_address(&[seed_key.as_ref(), &[1]], &program_id).unwrap(),
            key("976ymqVnfE32QFe6NfGDctSvVa36LWnvYxhU6G2232YL")
        );
    }

    #[test]
    fn create_program_address_seed_boundaries() {
        let program_id = upgradeable_loader();
        let err = create_program_address(&[&[127u8; 33]], &program_id).unwrap_err();
        assert_eq!(err, TxError::InvalidSeedLength { index: 0, len: 33 });

        // 32 bytes is fine (on-curve outcome aside)
        let result = create_program_address(&[&[0u8; 32]], &program_id);
        assert!(!matches!(result, Err(TxError::InvalidSeedLength { .. })));
    }

    #[test]
    fn create_program_address_seed_count() {
        let program_id = upgradeable_loader();
        let seeds: Vec<&[u8]> = vec![&b"x"[..]; 17];
        assert_eq!(
            create_program_address(&seeds, &program_id).unwrap_err(),
            TxError::TooManySeeds(17)
        );
    }

    #[test]
    fn different_seed_splits_differ() {
        let program_id = upgradeable_loader();
        assert_ne!(
            create_program_address(&[b"Talking", b"Squirrels"], &program_id).unwrap(),
            create_program_address(&[b"Talking"], &program_id).unwrap()
        );
    }

    // -- find_program_address -----------------------------------------------

    #[test]
    fn find_matches_create_with_bump() {
        let program_id = upgradeable_loader();
        for seed in [&b"Lil'"[..], &b"Bits"[..], &b""[..]] {
            let (address, bump) = find_program_address(&[seed], &program_id).unwrap();
            assert_eq!(
                create_program_address(&[seed, &[bump]], &program_id).unwrap(),
                address
            );
            assert!(!address.is_on_curve());
        }
    }

    #[test]
    fn find_is_deterministic() {
        let program_id = upgradeable_loader();
        let first = find_program_address(&[b"vault", b"user"], &program_id).unwrap();
        let second = find_program_address(&[b"vault", b"user"], &program_id).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn find_picks_highest_viable_bump() {
        let program_id = upgradeable_loader();
        let (_, bump) = find_program_address(&[b"escrow"], &program_id).unwrap();
        for higher in (bump as u16 + 1)..=255 {
            let higher = higher as u8;
            assert_eq!(
                create_program_address(&[b"escrow", &[higher]], &program_id).unwrap_err(),
                TxError::InvalidSeeds
            );
        }
    }

    #[test]
    fn find_accepts_empty_seed_list() {
        let program_id = upgradeable_loader();
        let (address, bump) = find_program_address(&[], &program_id).unwrap();
        assert_eq!(create_program_address(&[&[bump]], &program_id).unwrap(), address);
    }

    #[test]
    fn find_reserves_a_slot_for_the_bump() {
        let program_id = upgradeable_loader();
        let fifteen: Vec<&[u8]> = vec![&b"s"[..]; 15];
        assert!(find_program_address(&fifteen, &program_id).is_ok());

        let sixteen: Vec<&[u8]> = vec![&b"s"[..]; 16];
        assert_eq!(
            find_program_address(&sixteen, &program_id).unwrap_err(),
            TxError::TooManySeeds(16)
        );
        let seventeen: Vec<&[u8]> = vec![&b"s"[..]; 17];
        assert_eq!(
            find_program_address(&seventeen, &program_id).unwrap_err(),
            TxError::TooManySeeds(17)
        );
    }

    #[test]
    fn find_rejects_long_seed() {
        let program_id = upgradeable_loader();
        let long = [1u8; 33];
        assert_eq!(
            find_program_address(&[b"ok", &long], &program_id).unwrap_err(),
            TxError::InvalidSeedLength { index: 1, len: 33 }
        );
    }

    // -- create_with_seed ---------------------------------------------------

    #[test]
    fn create_with_seed_known_vector() {
        assert_eq!(
            create_with_seed(&Pubkey::default(), "limber chicken: 4/45", &Pubkey::default())
                .unwrap(),
            key("9h1HyLCW5dZnBVap8C5egQ9Z6pHyjsh5MNy83iPqqRuq")
        );
    }

    #[test]
    fn create_with_seed_length_limit() {
        let base = Pubkey::default();
        let owner = upgradeable_loader();
        assert!(create_with_seed(&base, &"a".repeat(32), &owner).is_ok());
        assert_eq!(
            create_with_seed(&base, &"a".repeat(33), &owner).unwrap_err(),
            TxError::InvalidSeedLength { index: 0, len: 33 }
        );
    }

    #[test]
    fn create_with_seed_rejects_marker_owner() {
        let mut owner = [0u8; 32];
        owner[32 - PDA_MARKER.len()..].copy_from_slice(PDA_MARKER);
        assert_eq!(
            create_with_seed(&Pubkey::default(), "seed", &Pubkey::new_from_array(owner))
                .unwrap_err(),
            TxError::IllegalOwner
        );
    }
}
