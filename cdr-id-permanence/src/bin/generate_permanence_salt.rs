use cdr_id_permanence::infrastructure::config::{
    generate_salt_base64, PermanenceConfig, ProductSaltConfig,
};

/// Print a fresh salt configuration for the software products named on the
/// command line, e.g.
///
/// ```text
/// generate_permanence_salt SP-1 SP-2 > permanence.toml
/// ```
///
/// A system-wide subject salt is always generated. Store the output as a
/// secret: rotating any salt invalidates every identifier issued under it.
fn main() {
    let mut config = PermanenceConfig::default();
    config.subject.salt = Some(generate_salt_base64());

    for product_id in std::env::args().skip(1) {
        if product_id.trim().is_empty() {
            eprintln!("software product id must not be empty");
            std::process::exit(1);
        }
        config.products.insert(
            product_id,
            ProductSaltConfig {
                id_salt: generate_salt_base64(),
                sub_salt: None,
            },
        );
    }

    match config.to_toml_string() {
        Ok(toml) => print!("{toml}"),
        Err(e) => {
            eprintln!("failed to render configuration: {e}");
            std::process::exit(1);
        }
    }
}
