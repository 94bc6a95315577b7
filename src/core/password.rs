/// Access token generation for characters whose reply carries no password.
use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use rand::Rng;

pub const DEFAULT_PASSWORD_LENGTH: usize = 10;

/// Random ASCII-alphanumeric token of `length` characters drawn from `rng`.
pub fn generate_password_with<R: Rng>(rng: &mut R, length: usize) -> String {
    (0..length)
        .map(|_| char::from(rng.sample(Alphanumeric)))
        .collect()
}

/// Token from the operating system's secure RNG.
pub fn generate_password(length: usize) -> String {
    generate_password_with(&mut OsRng, length)
}
