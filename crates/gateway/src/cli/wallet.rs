//! `trendpup wallet …` — the chat wallet texts, offline.

use tp_market::wallet;

use super::WalletCommand;

/// The text the assistant would answer with.
pub fn report(command: &WalletCommand) -> anyhow::Result<String> {
    match command {
        WalletCommand::Address { text } => Ok(match wallet::lookup_address(&text.join(" ")) {
            Ok(address) => address,
            Err(prompt) => prompt.to_string(),
        }),
        WalletCommand::Balance {
            address,
            base_units,
        } => {
            let address = wallet::lookup_address(address).map_err(|prompt| anyhow::anyhow!(prompt))?;
            wallet::balance_reply(&address, base_units)
                .ok_or_else(|| anyhow::anyhow!("not an amount in base units: {base_units}"))
        }
    }
}

pub fn run(command: WalletCommand) -> anyhow::Result<()> {
    println!("{}", report(&command)?);
    Ok(())
}
