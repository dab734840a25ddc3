use anyhow::Result;

use crate::notify::codec::url_b64_to_bytes;

pub fn run(key: &str) -> Result<()> {
    let bytes = url_b64_to_bytes(key)?;
    let hex: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
    println!("{} bytes", bytes.len());
    println!("{}", hex);
    Ok(())
}
