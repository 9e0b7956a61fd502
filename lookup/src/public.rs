// III-IV
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Lookups backed by the free agify.io, genderize.io and nationalize.io APIs.

use crate::{CountryIsoCode, LookupResult, NameLookup};
use async_trait::async_trait;
use bytes::Buf;
use derivative::Derivative;
use log::{debug, warn};
use people_core::env::get_optional_var;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::io;

/// Default endpoint of the age guessing service.
const DEFAULT_AGE_URL: &str = "https://api.agify.io/";

/// Default endpoint of the gender guessing service.
const DEFAULT_GENDER_URL: &str = "https://api.genderize.io/";

/// Default endpoint of the country guessing service.
const DEFAULT_COUNTRY_URL: &str = "https://api.nationalize.io/";

/// Converts a `reqwest::Error` to an `io::Error`.
fn reqwest_error_to_io_error(e: reqwest::Error) -> io::Error {
    io::Error::other(format!("{}", e))
}

/// Converts a failed `reqwest::Response` to an `io::Error`.
async fn http_response_to_io_error(response: Response) -> io::Error {
    let status = response.status();

    warn!("Lookup service at {} replied with status {}", response.url(), status);

    let kind = match status {
        // Match against the codes we know the services explicitly hand us.
        StatusCode::UNAUTHORIZED => io::ErrorKind::PermissionDenied,
        StatusCode::PAYMENT_REQUIRED => io::ErrorKind::PermissionDenied,
        StatusCode::UNPROCESSABLE_ENTITY => io::ErrorKind::InvalidInput,

        // The free tiers reply with this when the daily quota is exhausted.
        StatusCode::TOO_MANY_REQUESTS => io::ErrorKind::ConnectionRefused,

        _ => io::ErrorKind::Other,
    };

    match response.text().await {
        Ok(text) => io::Error::new(
            kind,
            format!("HTTP request returned status {} with text '{}'", status, text),
        ),
        Err(e) => io::Error::new(
            kind,
            format!("HTTP request returned status {} and failed to get text due to {}", status, e),
        ),
    }
}

/// Reply from the age guessing service.
#[derive(Deserialize)]
struct AgeResponse {
    /// Estimated age, or null when the name is unknown.
    age: Option<u32>,
}

impl AgeResponse {
    /// Extracts the age from the reply, validating that it is reasonable.
    fn into_age(self) -> LookupResult<Option<u16>> {
        match self.age {
            Some(age) => match u16::try_from(age) {
                Ok(age) => Ok(Some(age)),
                Err(_) => Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("Age {} is out of range", age),
                )),
            },
            None => Ok(None),
        }
    }
}

/// Reply from the gender guessing service.
#[derive(Deserialize)]
struct GenderResponse {
    /// Estimated gender, or null when the name is unknown.
    gender: Option<String>,
}

impl GenderResponse {
    /// Extracts the gender from the reply.
    fn into_gender(self) -> Option<String> {
        self.gender.filter(|gender| !gender.is_empty())
    }
}

/// One of the candidate countries in a reply from the country guessing service.
#[derive(Deserialize)]
struct CountryCandidate {
    /// Country ISO code of the candidate.
    country_id: CountryIsoCode,
}

/// Reply from the country guessing service.
#[derive(Deserialize)]
struct CountryResponse {
    /// Candidate countries sorted by decreasing probability.  Empty when the name is unknown.
    #[serde(default)]
    country: Vec<CountryCandidate>,
}

impl CountryResponse {
    /// Extracts the most probable country from the reply.
    fn into_country(self) -> Option<CountryIsoCode> {
        self.country.into_iter().next().map(|candidate| candidate.country_id)
    }
}

/// Options to establish a connection to the public lookup APIs.
#[derive(Clone, Derivative)]
#[derivative(Debug, Default, PartialEq)]
pub struct PublicApisOptions {
    /// Endpoint of the age guessing service.
    #[derivative(Default(value = "DEFAULT_AGE_URL.to_owned()"))]
    pub age_url: String,

    /// Endpoint of the gender guessing service.
    #[derivative(Default(value = "DEFAULT_GENDER_URL.to_owned()"))]
    pub gender_url: String,

    /// Endpoint of the country guessing service.
    #[derivative(Default(value = "DEFAULT_COUNTRY_URL.to_owned()"))]
    pub country_url: String,
}

impl PublicApisOptions {
    /// Initializes a set of options from environment variables whose name is prefixed with the
    /// given `prefix`.
    ///
    /// This will use variables such as `<prefix>_AGE_URL`, `<prefix>_GENDER_URL` and
    /// `<prefix>_COUNTRY_URL`, falling back to the public endpoints for those that are missing.
    pub fn from_env(prefix: &str) -> Result<Self, String> {
        /// Reads the optional URL `<prefix>_<suffix>` and validates it.
        fn get_url(prefix: &str, suffix: &str, default: &str) -> Result<String, String> {
            match get_optional_var::<String>(prefix, suffix)? {
                Some(raw) => match url::Url::parse(&raw) {
                    Ok(_) => Ok(raw),
                    Err(e) => Err(format!("Invalid URL in {}_{}: {}", prefix, suffix, e)),
                },
                None => Ok(default.to_owned()),
            }
        }

        Ok(Self {
            age_url: get_url(prefix, "AGE_URL", DEFAULT_AGE_URL)?,
            gender_url: get_url(prefix, "GENDER_URL", DEFAULT_GENDER_URL)?,
            country_url: get_url(prefix, "COUNTRY_URL", DEFAULT_COUNTRY_URL)?,
        })
    }
}

/// Name lookup backed by the free public APIs.
#[derive(Clone)]
pub struct PublicApisLookup {
    /// Asynchronous HTTP client with which to issue the service requests.
    client: Client,

    /// Configuration for the lookups.
    opts: PublicApisOptions,
}

impl PublicApisLookup {
    /// Creates a new lookup client using `opts` for configuration.
    pub fn new(opts: PublicApisOptions) -> Self {
        Self { client: Client::default(), opts }
    }

    /// Queries the service at `url` for `name` and decodes its JSON reply.
    async fn query<T: DeserializeOwned>(&self, url: &str, name: &str) -> LookupResult<T> {
        debug!("Querying {} for name '{}'", url, name);
        let response = self
            .client
            .get(url)
            .query(&[("name", name)])
            .send()
            .await
            .map_err(reqwest_error_to_io_error)?;
        match response.status() {
            StatusCode::OK => {
                let bytes = response.bytes().await.map_err(reqwest_error_to_io_error)?;
                Ok(serde_json::from_reader(bytes.reader())?)
            }
            _ => Err(http_response_to_io_error(response).await),
        }
    }
}

#[async_trait]
impl NameLookup for PublicApisLookup {
    async fn age(&self, name: &str) -> LookupResult<Option<u16>> {
        let response: AgeResponse = self.query(&self.opts.age_url, name).await?;
        response.into_age()
    }

    async fn gender(&self, name: &str) -> LookupResult<Option<String>> {
        let response: GenderResponse = self.query(&self.opts.gender_url, name).await?;
        Ok(response.into_gender())
    }

    async fn country(&self, name: &str) -> LookupResult<Option<CountryIsoCode>> {
        let response: CountryResponse = self.query(&self.opts.country_url, name).await?;
        Ok(response.into_country())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::extract::Query;
    use axum::routing::get;
    use std::collections::HashMap;

    /// Starts a fake service on a random local port that replies with `status` and `body` to
    /// every query, replacing `NAME` in the body with the queried name.  Returns its base URL.
    async fn start_fake_service(status: StatusCode, body: &'static str) -> String {
        let _can_fail = env_logger::builder().is_test(true).try_init();

        let app = Router::new().route(
            "/",
            get(move |Query(params): Query<HashMap<String, String>>| async move {
                let name = params.get("name").cloned().unwrap_or_default();
                (status, body.replace("NAME", &name))
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{}/", address)
    }

    /// Creates a lookup client where all services point to `url`.
    fn lookup_for(url: &str) -> PublicApisLookup {
        PublicApisLookup::new(PublicApisOptions {
            age_url: url.to_owned(),
            gender_url: url.to_owned(),
            country_url: url.to_owned(),
        })
    }

    #[test]
    fn test_age_response() {
        let response: AgeResponse =
            serde_json::from_str(r#"{"count": 298219, "name": "alice", "age": 34}"#).unwrap();
        assert_eq!(Some(34), response.into_age().unwrap());

        let response: AgeResponse =
            serde_json::from_str(r#"{"count": 0, "name": "zzxq", "age": null}"#).unwrap();
        assert_eq!(None, response.into_age().unwrap());

        let response: AgeResponse =
            serde_json::from_str(r#"{"count": 1, "name": "old", "age": 70000}"#).unwrap();
        assert_eq!(io::ErrorKind::InvalidData, response.into_age().unwrap_err().kind());
    }

    #[test]
    fn test_gender_response() {
        let response: GenderResponse = serde_json::from_str(
            r#"{"count": 1, "name": "alice", "gender": "female", "probability": 0.98}"#,
        )
        .unwrap();
        assert_eq!(Some("female".to_owned()), response.into_gender());

        let response: GenderResponse = serde_json::from_str(
            r#"{"count": 0, "name": "zzxq", "gender": null, "probability": 0.0}"#,
        )
        .unwrap();
        assert_eq!(None, response.into_gender());
    }

    #[test]
    fn test_country_response() {
        let response: CountryResponse = serde_json::from_str(
            r#"{"count": 5, "name": "dmitriy", "country": [
                {"country_id": "UA", "probability": 0.41},
                {"country_id": "RU", "probability": 0.39}
            ]}"#,
        )
        .unwrap();
        assert_eq!(Some(CountryIsoCode::new("UA").unwrap()), response.into_country());

        let response: CountryResponse =
            serde_json::from_str(r#"{"count": 0, "name": "zzxq", "country": []}"#).unwrap();
        assert_eq!(None, response.into_country());

        let response: CountryResponse =
            serde_json::from_str(r#"{"count": 0, "name": "zzxq"}"#).unwrap();
        assert_eq!(None, response.into_country());
    }

    #[test]
    fn test_country_response_bad_code() {
        serde_json::from_str::<CountryResponse>(
            r#"{"count": 1, "name": "x", "country": [{"country_id": "XYZ", "probability": 1}]}"#,
        )
        .err()
        .unwrap();
    }

    #[test]
    fn test_public_apis_options_from_env_defaults() {
        temp_env::with_vars(
            [
                ("DEFAULTS_AGE_URL", None::<&str>),
                ("DEFAULTS_GENDER_URL", None),
                ("DEFAULTS_COUNTRY_URL", None),
            ],
            || {
                let opts = PublicApisOptions::from_env("DEFAULTS").unwrap();
                assert_eq!(PublicApisOptions::default(), opts);
                assert_eq!("https://api.agify.io/", opts.age_url);
                assert_eq!("https://api.genderize.io/", opts.gender_url);
                assert_eq!("https://api.nationalize.io/", opts.country_url);
            },
        );
    }

    #[test]
    fn test_public_apis_options_from_env_overrides() {
        temp_env::with_vars(
            [
                ("OVERRIDES_AGE_URL", Some("http://localhost:1234/age")),
                ("OVERRIDES_GENDER_URL", None),
                ("OVERRIDES_COUNTRY_URL", Some("http://localhost:1234/country")),
            ],
            || {
                let opts = PublicApisOptions::from_env("OVERRIDES").unwrap();
                assert_eq!(
                    PublicApisOptions {
                        age_url: "http://localhost:1234/age".to_owned(),
                        gender_url: DEFAULT_GENDER_URL.to_owned(),
                        country_url: "http://localhost:1234/country".to_owned(),
                    },
                    opts
                );
            },
        );
    }

    #[test]
    fn test_public_apis_options_from_env_bad_url() {
        temp_env::with_vars(
            [
                ("BAD_AGE_URL", Some("not a url")),
                ("BAD_GENDER_URL", None),
                ("BAD_COUNTRY_URL", None),
            ],
            || {
                let err = PublicApisOptions::from_env("BAD").unwrap_err();
                assert!(err.contains("Invalid URL in BAD_AGE_URL"));
            },
        );
    }

    #[tokio::test]
    async fn test_age_ok() {
        let url =
            start_fake_service(StatusCode::OK, r#"{"count": 1, "name": "NAME", "age": 34}"#).await;
        assert_eq!(Some(34), lookup_for(&url).age("Alice").await.unwrap());
    }

    #[tokio::test]
    async fn test_gender_ok() {
        let url = start_fake_service(
            StatusCode::OK,
            r#"{"count": 1, "name": "NAME", "gender": "female", "probability": 0.98}"#,
        )
        .await;
        assert_eq!(Some("female".to_owned()), lookup_for(&url).gender("Alice").await.unwrap());
    }

    #[tokio::test]
    async fn test_country_ok() {
        let url = start_fake_service(
            StatusCode::OK,
            r#"{"count": 1, "name": "NAME", "country": [{"country_id": "US", "probability": 0.3}]}"#,
        )
        .await;
        assert_eq!(
            Some(CountryIsoCode::new("US").unwrap()),
            lookup_for(&url).country("Alice").await.unwrap()
        );
    }

    #[tokio::test]
    async fn test_name_is_encoded() {
        let url = start_fake_service(
            StatusCode::OK,
            r#"{"count": 1, "name": "NAME", "gender": "NAME", "probability": 1}"#,
        )
        .await;
        assert_eq!(
            Some("Zoë & Ann".to_owned()),
            lookup_for(&url).gender("Zoë & Ann").await.unwrap()
        );
    }

    #[tokio::test]
    async fn test_rate_limited() {
        let url = start_fake_service(
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"error": "Request limit reached"}"#,
        )
        .await;
        let err = lookup_for(&url).age("Alice").await.unwrap_err();
        assert_eq!(io::ErrorKind::ConnectionRefused, err.kind());
        assert!(err.to_string().contains("Request limit reached"));
    }

    #[tokio::test]
    async fn test_server_error() {
        let url = start_fake_service(StatusCode::INTERNAL_SERVER_ERROR, "oops").await;
        let err = lookup_for(&url).country("Alice").await.unwrap_err();
        assert_eq!(io::ErrorKind::Other, err.kind());
    }

    #[tokio::test]
    async fn test_invalid_json() {
        let url = start_fake_service(StatusCode::OK, "this is not json").await;
        lookup_for(&url).age("Alice").await.unwrap_err();
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let err = lookup_for("http://127.0.0.1:1/").gender("Alice").await.unwrap_err();
        assert_eq!(io::ErrorKind::Other, err.kind());
    }

    #[tokio::test]
    #[ignore = "Talks to an external service"]
    async fn test_real_services() {
        let lookup = PublicApisLookup::new(PublicApisOptions::default());
        assert!(lookup.age("Alice").await.unwrap().is_some());
        assert_eq!(Some("female".to_owned()), lookup.gender("Alice").await.unwrap());
        assert!(lookup.country("Alice").await.unwrap().is_some());
    }
}
