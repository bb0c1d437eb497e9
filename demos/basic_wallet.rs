use keyforge::{
    derive_chain_keys, derive_master_key, generate_seed_phrase, Chain, SeedPhraseSize,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Keyforge Multi-Chain Wallet Demo");
    println!("================================");

    // An operator-supplied phrase makes the run deterministic; without it
    // a fresh 24-word phrase is generated from OS entropy.
    let override_phrase = std::env::var("SEED_PHRASE").ok();
    let seed_phrase = generate_seed_phrase(SeedPhraseSize::Words24, override_phrase.as_deref())?;

    println!("\n⚠️  IMPORTANT: Write down your seed phrase and store it securely!");
    println!("Seed phrase ({} words): {}", seed_phrase.word_count(), seed_phrase.phrase());

    let master = derive_master_key(&seed_phrase)?;
    println!("\nMaster key fingerprint: {:02x?}", master.fingerprint());
    println!("XPRV: {}", master.to_xprv());
    println!("XPUB: {}", master.to_xpub());

    for chain in [Chain::Bitcoin, Chain::Ethereum, Chain::Solana] {
        let bundle = derive_chain_keys(chain, &master, &seed_phrase)?;
        println!("\n{}:", chain);
        println!("{}", serde_json::to_string_pretty(&bundle)?);
    }

    Ok(())
}
