//! Property tests: identifiers round-trip, are stable, stay bound to their
//! context and reject tampering, for arbitrary non-blank Unicode inputs.

use cdr_id_permanence::domain::SaltMaterial;
use cdr_id_permanence::{
    CustomerId, DefaultPermanenceService, DeterministicIdentifierCipher, IdParameters, KeyTable,
    PermanenceService, SoftwareProductId, SubParameters,
};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Helpers / Strategies
// ---------------------------------------------------------------------------

fn salt(byte: u8) -> SaltMaterial {
    SaltMaterial::new(vec![byte; 32]).unwrap()
}

/// Service with its own id salt for every product and a shared subject salt.
fn service_for(products: &[&str]) -> DefaultPermanenceService {
    let table = products.iter().zip(1u8..).fold(
        KeyTable::new().with_subject_salt(salt(0xA5)),
        |table, (product, byte)| table.with_product(SoftwareProductId::new(*product), salt(byte), None),
    );
    PermanenceService::new(table, DeterministicIdentifierCipher)
}

/// Any Unicode text, control characters included, that is not blank.
fn arb_field() -> impl Strategy<Value = String> {
    "(?s).{1,32}".prop_filter("field must not be blank", |value| !value.trim().is_empty())
}

/// Flip one of the low seven bits of one character. Tokens are ASCII, so the
/// result is still valid UTF-8.
fn flip_bit(token: &str, index: prop::sample::Index, bit: u8) -> String {
    let mut bytes = token.as_bytes().to_vec();
    let at = index.index(bytes.len());
    bytes[at] ^= 1 << bit;
    String::from_utf8(bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Property Tests
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn sub_round_trips_and_is_stable(
        customer in arb_field(),
        product in arb_field(),
        sector in arb_field(),
    ) {
        let service = service_for(&[product.as_str()]);
        let params = SubParameters::new(product.as_str(), sector.as_str());
        let customer = CustomerId::new(customer);

        let token = service.encrypt_sub(&customer, &params).unwrap();
        prop_assert_eq!(&service.encrypt_sub(&customer, &params).unwrap(), &token);
        prop_assert_eq!(service.decrypt_sub(token.as_str(), &params), Ok(customer));
    }

    #[test]
    fn id_round_trips_and_is_stable(
        internal_id in arb_field(),
        customer in arb_field(),
        product in arb_field(),
    ) {
        let service = service_for(&[product.as_str()]);
        let params = IdParameters::new(customer.as_str(), product.as_str());

        let token = service.encrypt_id(&internal_id, &params).unwrap();
        prop_assert_eq!(&service.encrypt_id(&internal_id, &params).unwrap(), &token);
        prop_assert_eq!(service.decrypt_id(token.as_str(), &params), Ok(internal_id));
    }

    #[test]
    fn sub_never_resolves_for_another_product(
        customer in arb_field(),
        product_a in arb_field(),
        product_b in arb_field(),
        sector in arb_field(),
    ) {
        prop_assume!(product_a != product_b);
        let service = service_for(&[product_a.as_str(), product_b.as_str()]);
        let customer = CustomerId::new(customer);

        let token = service
            .encrypt_sub(&customer, &SubParameters::new(product_a.as_str(), sector.as_str()))
            .unwrap();
        prop_assert!(service
            .decrypt_sub(token.as_str(), &SubParameters::new(product_b.as_str(), sector.as_str()))
            .is_err());
    }

    #[test]
    fn sub_never_resolves_for_another_sector(
        customer in arb_field(),
        product in arb_field(),
        sector_a in arb_field(),
        sector_b in arb_field(),
    ) {
        let params_a = SubParameters::new(product.as_str(), sector_a.as_str());
        let params_b = SubParameters::new(product.as_str(), sector_b.as_str());
        prop_assume!(params_a.sector_identifier_uri != params_b.sector_identifier_uri);
        let service = service_for(&[product.as_str()]);

        let token = service.encrypt_sub(&CustomerId::new(customer), &params_a).unwrap();
        prop_assert!(service.decrypt_sub(token.as_str(), &params_b).is_err());
    }

    #[test]
    fn id_never_resolves_in_another_context(
        internal_id in arb_field(),
        customer_a in arb_field(),
        customer_b in arb_field(),
        product_a in arb_field(),
        product_b in arb_field(),
    ) {
        prop_assume!(product_a != product_b);
        prop_assume!(customer_a != customer_b);
        let service = service_for(&[product_a.as_str(), product_b.as_str()]);

        let token = service
            .encrypt_id(&internal_id, &IdParameters::new(customer_a.as_str(), product_a.as_str()))
            .unwrap();
        for other in [
            IdParameters::new(customer_a.as_str(), product_b.as_str()),
            IdParameters::new(customer_b.as_str(), product_a.as_str()),
        ] {
            prop_assert!(service.decrypt_id(token.as_str(), &other).is_err());
        }
    }

    #[test]
    fn single_bit_flip_in_token_is_rejected(
        customer in arb_field(),
        internal_id in arb_field(),
        index in any::<prop::sample::Index>(),
        bit in 0u8..7,
    ) {
        let service = service_for(&["SP-1"]);
        let sub_params = SubParameters::new("SP-1", "https://adr.example/redirect");
        let id_params = IdParameters::new(customer.as_str(), "SP-1");

        let sub = service.encrypt_sub(&CustomerId::new(customer.as_str()), &sub_params).unwrap();
        let id = service.encrypt_id(&internal_id, &id_params).unwrap();

        prop_assert!(service.decrypt_sub(&flip_bit(sub.as_str(), index, bit), &sub_params).is_err());
        prop_assert!(service.decrypt_id(&flip_bit(id.as_str(), index, bit), &id_params).is_err());
    }
}
