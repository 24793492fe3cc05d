use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::core::ports::tokener::{Payload, Tokener};
use crate::error::Error;

pub struct JWT {
    secret: Vec<u8>,
}

impl JWT {
    pub fn new(secret: Vec<u8>) -> Self {
        Self { secret }
    }
}

impl<P> Tokener<P> for JWT
where
    P: Payload,
{
    fn gen_token(&self, payload: &P) -> Result<String, Error> {
        let header = Header::new(Algorithm::HS256);
        let key = EncodingKey::from_secret(&self.secret);
        let token = encode(&header, payload, &key)?;
        Ok(token)
    }

    fn verify_token(&self, token: &str) -> Result<P, Error> {
        let key = DecodingKey::from_secret(&self.secret);
        let validation = Validation::new(Algorithm::HS256);
        let payload = decode(token, &key, &validation)?;
        Ok(payload.claims)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::core::auth::Role;
    use crate::middlewares::jwt::Claim;
    use std::ops::Add;

    #[test]
    fn test_gen_and_verify_token() {
        let jwt = JWT::new(vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 0]);
        let claim = Claim {
            sub: "a@x.com".into(),
            role: Role::Student,
            exp: chrono::Utc::now().add(chrono::Duration::days(1)).timestamp(),
        };
        let token = jwt.gen_token(&claim).unwrap();
        let got: Claim = jwt.verify_token(&token).unwrap();
        assert_eq!(got.sub, "a@x.com");
        assert_eq!(got.role, Role::Student);
    }

    #[test]
    fn test_expired_token_is_refused() {
        let jwt = JWT::new(b"secret".to_vec());
        let claim = Claim {
            sub: "INS1".into(),
            role: Role::Institute,
            exp: chrono::Utc::now().timestamp() - 3600,
        };
        let token = jwt.gen_token(&claim).unwrap();
        assert!(<JWT as Tokener<Claim>>::verify_token(&jwt, &token).is_err());
    }
}
