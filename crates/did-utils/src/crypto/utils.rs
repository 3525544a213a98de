use super::errors::Error;

// Generate a seed from an optional initial seed.
// An empty initial seed is replaced with random bytes from the OS.
pub(super) fn generate_seed<const N: usize>(initial_seed: &[u8]) -> Result<[u8; N], Error> {
    let mut seed = [0u8; N];
    if initial_seed.is_empty() {
        getrandom::getrandom(&mut seed).map_err(|err| Error::Entropy(err.to_string()))?;
    } else if initial_seed.len() == N {
        seed.copy_from_slice(initial_seed);
    } else {
        return Err(Error::InvalidSeed);
    }
    Ok(seed)
}
