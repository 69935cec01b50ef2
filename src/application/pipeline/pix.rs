//! # PIX BR Code
//!
//! EMV(R) QR payload generation for PIX deposits.
//!
//! The payload is a TLV string per the BR Code specification: each field
//! is `id (2 digits) + length (2 digits) + value`, with the merchant
//! account information nesting the PIX key under the `br.gov.bcb.pix`
//! GUI, and a CRC16-CCITT (polynomial 0x1021, init 0xFFFF) over the
//! whole payload including the `6304` CRC header as the final field.

use rust_decimal::Decimal;

/// Payload format indicator: static BR Code, version 01.
const PAYLOAD_FORMAT: &str = "01";

/// GUI identifying the PIX arrangement inside field 26.
const PIX_GUI: &str = "br.gov.bcb.pix";

/// ISO 4217 numeric code for BRL.
const CURRENCY_BRL: &str = "986";

/// Country code field value.
const COUNTRY_BR: &str = "BR";

/// Maximum merchant name length the spec allows.
const MAX_NAME_LEN: usize = 25;

/// Maximum merchant city length the spec allows.
const MAX_CITY_LEN: usize = 15;

/// Formats one TLV field.
fn tlv(id: &str, value: &str) -> String {
    format!("{}{:02}{}", id, value.len(), value)
}

/// CRC16-CCITT (FALSE): polynomial 0x1021, initial value 0xFFFF, no
/// reflection, no final xor.
#[must_use]
pub fn crc16_ccitt(data: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for &byte in data {
        crc ^= u16::from(byte) << 8;
        for _ in 0..8 {
            if crc & 0x8000 != 0 {
                crc = (crc << 1) ^ 0x1021;
            } else {
                crc <<= 1;
            }
        }
    }
    crc
}

/// Builds a static PIX BR Code payload.
///
/// `amount` renders with two decimal places; `reference` lands in the
/// additional-data field (62/05) so the deposit webhook can match the
/// incoming transfer.
#[must_use]
pub fn br_code(
    pix_key: &str,
    merchant_name: &str,
    merchant_city: &str,
    amount: Decimal,
    reference: &str,
) -> String {
    let account_info = format!("{}{}", tlv("00", PIX_GUI), tlv("01", pix_key));
    let additional_data = tlv("05", reference);

    let name: String = merchant_name.chars().take(MAX_NAME_LEN).collect();
    let city: String = merchant_city.chars().take(MAX_CITY_LEN).collect();
    let amount_text = format!("{:.2}", amount);

    let mut payload = String::new();
    payload.push_str(&tlv("00", PAYLOAD_FORMAT));
    payload.push_str(&tlv("26", &account_info));
    payload.push_str(&tlv("52", "0000"));
    payload.push_str(&tlv("53", CURRENCY_BRL));
    payload.push_str(&tlv("54", &amount_text));
    payload.push_str(&tlv("58", COUNTRY_BR));
    payload.push_str(&tlv("59", &name));
    payload.push_str(&tlv("60", &city));
    payload.push_str(&tlv("62", &additional_data));

    // The CRC covers everything up to and including its own "6304" header.
    payload.push_str("6304");
    let crc = crc16_ccitt(payload.as_bytes());
    payload.push_str(&format!("{:04X}", crc));
    payload
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn crc16_known_vector() {
        // Classic CCITT-FALSE check value for "123456789".
        assert_eq!(crc16_ccitt(b"123456789"), 0x29B1);
    }

    #[test]
    fn tlv_pads_length_to_two_digits() {
        assert_eq!(tlv("00", "01"), "000201");
        assert_eq!(tlv("59", "Corridor"), "5908Corridor");
    }

    #[test]
    fn payload_opens_with_format_indicator() {
        let code = br_code(
            "treasury@corridor.example",
            "Corridor Pagamentos",
            "SAO PAULO",
            dec!(10000),
            "r1a2b3c4d-c1",
        );
        assert!(code.starts_with("000201"));
    }

    #[test]
    fn payload_carries_key_amount_and_reference() {
        let code = br_code(
            "treasury@corridor.example",
            "Corridor Pagamentos",
            "SAO PAULO",
            dec!(10000.5),
            "r1a2b3c4d-c1",
        );
        assert!(code.contains("br.gov.bcb.pix"));
        assert!(code.contains("treasury@corridor.example"));
        assert!(code.contains("10000.50"));
        assert!(code.contains("r1a2b3c4d-c1"));
        assert!(code.contains("5802BR"));
        assert!(code.contains("5303986"));
    }

    #[test]
    fn crc_verifies_over_full_payload() {
        let code = br_code(
            "treasury@corridor.example",
            "Corridor Pagamentos",
            "SAO PAULO",
            dec!(500),
            "ref-1",
        );
        let (body, crc_text) = code.split_at(code.len() - 4);
        let expected = u16::from_str_radix(crc_text, 16).unwrap();
        assert_eq!(crc16_ccitt(body.as_bytes()), expected);
        assert!(body.ends_with("6304"));
    }

    #[test]
    fn overlong_names_truncate_to_spec_limits() {
        let code = br_code(
            "key",
            "A Very Long Corporate Name That Exceeds The Limit",
            "A City Name Too Long For The Field",
            dec!(1),
            "r",
        );
        assert!(code.contains("5925A Very Long Corporate Nam"));
        assert!(code.contains("6015A City Name Too"));
    }
}
