//! HS256 token codec: signs payloads into compact tokens and decodes them back.
//!
//! Decoding checks, in order: structure, signature, required fields, expiry. Expiry is judged
//! against the injected [`Clock`] with no leeway, so a token is rejected from the instant `now`
//! reaches `exp`.

// crates.io
use jsonwebtoken::{
	Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind as JwtErrorKind,
};
// self
use crate::{
	_prelude::*,
	auth::{
		ClaimSet, SignedToken, SubjectId, TokenId, TokenKind, TokenPayload,
		token::payload::whole_seconds,
	},
	clock::Clock,
	config::{MAX_TOKEN_TTL_SECS, SigningSecret},
	error::ConfigError,
};

/// Signs and verifies session tokens with a shared HMAC secret.
#[derive(Clone)]
pub struct TokenCodec {
	encoding: EncodingKey,
	decoding: DecodingKey,
	header: Header,
	validation: Validation,
	clock: Arc<dyn Clock>,
}
impl TokenCodec {
	/// Builds a codec after checking the secret is present and long enough.
	pub fn new(secret: &SigningSecret, clock: Arc<dyn Clock>) -> Result<Self, ConfigError> {
		secret.validate()?;

		let mut validation = Validation::new(Algorithm::HS256);

		// Expiry is evaluated against the injected clock after decoding.
		validation.validate_exp = false;
		validation.validate_aud = false;
		validation.leeway = 0;
		validation.required_spec_claims.clear();

		Ok(Self {
			encoding: EncodingKey::from_secret(secret.expose()),
			decoding: DecodingKey::from_secret(secret.expose()),
			header: Header::new(Algorithm::HS256),
			validation,
			clock,
		})
	}

	/// Current instant according to the codec clock.
	pub fn now(&self) -> OffsetDateTime {
		self.clock.now()
	}

	/// Mints a token for `subject` valid for `ttl` from now.
	pub fn issue(
		&self,
		subject: &SubjectId,
		kind: TokenKind,
		claims: &ClaimSet,
		ttl: Duration,
	) -> Result<(SignedToken, TokenPayload)> {
		let iat = whole_seconds(self.clock.now());
		let exp = iat
			.checked_add(ttl)
			.ok_or(ConfigError::OutOfRange { field: "token_ttl", max: MAX_TOKEN_TTL_SECS })?;
		let payload = TokenPayload {
			sub: subject.clone(),
			jti: TokenId::generate(),
			kind,
			iat,
			exp,
			claims: claims.clone(),
		};
		let token = jsonwebtoken::encode(&self.header, &payload, &self.encoding)
			.map_err(|e| Error::malformed(format!("token could not be encoded: {e}")))?;

		Ok((SignedToken::new(token), payload))
	}

	/// Verifies `serialized` and returns its payload if it is intact and unexpired.
	pub fn decode(&self, serialized: &str) -> Result<TokenPayload> {
		let payload = self.decode_unexpired_or_not(serialized)?;

		if payload.is_expired_at(self.clock.now()) {
			return Err(Error::Expired);
		}

		Ok(payload)
	}

	/// Verifies structure and signature only; the payload may already be expired.
	pub(crate) fn decode_unexpired_or_not(&self, serialized: &str) -> Result<TokenPayload> {
		let data =
			jsonwebtoken::decode::<TokenPayload>(serialized, &self.decoding, &self.validation)
				.map_err(|e| match e.kind() {
					JwtErrorKind::InvalidSignature => Error::SignatureInvalid,
					_ => Error::malformed(e),
				})?;

		Ok(data.claims)
	}
}
impl Debug for TokenCodec {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenCodec").field("algorithm", &self.header.alg).finish()
	}
}
