//! `wakamiti normalize`: show the URL fragment a menu label maps to

use clap::Args;

use wakamiti_e2e::normalize::LocaleToken;

#[derive(Args)]
pub struct NormalizeArgs {
    /// Menu label, e.g. "Gestión OT"
    pub label: String,
}

pub fn execute(args: NormalizeArgs) {
    let token = LocaleToken::new(&args.label);
    println!("{}\t{}", token, token.url_fragment());
}
