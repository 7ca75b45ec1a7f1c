/// A random 256-bit token, hex encoded, for links sent by email.
pub fn generate_email_token() -> String {
    hex::encode(rand::random::<[u8; 32]>())
}
