//! Decrypted note representation.

use super::NoteCipherError;
use crate::asset::AssetDescriptor;
use std::str::FromStr;

const FIELD_SEPARATOR: char = '|';

/// A decrypted note. Spent-state is not part of the note; the engine owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
	/// Amount in the asset's base unit.
	pub amount: u64,
	/// Commitment blinding factor, decimal text.
	pub blinding: String,
	/// Leaf position of the note's commitment.
	pub index: u64,
	pub asset: AssetDescriptor,
}

impl Note {
	/// `amount|blinding|index|asset`
	pub fn to_plaintext(&self) -> String {
		format!(
			"{amount}{sep}{blinding}{sep}{index}{sep}{asset}",
			amount = self.amount,
			blinding = self.blinding,
			index = self.index,
			asset = self.asset,
			sep = FIELD_SEPARATOR
		)
	}

	pub fn from_plaintext(plaintext: &str) -> Result<Self, NoteCipherError> {
		let fields: Vec<&str> = plaintext.split(FIELD_SEPARATOR).collect();
		let [amount, blinding, index, asset] = fields.as_slice() else {
			return Err(NoteCipherError::MalformedPlaintext(format!(
				"expected 4 fields, got {}",
				fields.len()
			)));
		};

		Ok(Self {
			amount: amount
				.parse()
				.map_err(|e| NoteCipherError::MalformedPlaintext(format!("amount: {}", e)))?,
			blinding: blinding.to_string(),
			index: index
				.parse()
				.map_err(|e| NoteCipherError::MalformedPlaintext(format!("index: {}", e)))?,
			asset: AssetDescriptor::from_str(asset)
				.map_err(|e| NoteCipherError::MalformedPlaintext(format!("asset: {}", e)))?,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_plaintext_layout() {
		let note = Note {
			amount: 9_950_000,
			blinding: "123456789".to_string(),
			index: 17,
			asset: AssetDescriptor::Native,
		};
		assert_eq!(note.to_plaintext(), "9950000|123456789|17|native");
		assert_eq!(Note::from_plaintext(&note.to_plaintext()).unwrap(), note);
	}

	#[test]
	fn test_malformed_plaintext() {
		for bad in ["", "1|2|3", "x|1|2|native", "1|2|y|native", "1|2|3|###"] {
			assert!(
				matches!(
					Note::from_plaintext(bad),
					Err(NoteCipherError::MalformedPlaintext(_))
				),
				"{bad:?} should be rejected"
			);
		}
	}
}
