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

//! Typed access to the environment variables that configure the services.
//!
//! Variables are addressed as `<prefix>_<suffix>` so that the same option structs can be loaded
//! for different deployments, as in `PGSQL_PROD_URL` vs. `PGSQL_TEST_URL`.

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

/// Result type for environment errors.
type Result<T> = std::result::Result<T, String>;

/// Raw textual value read from the environment, pending conversion to its target type.
pub struct Value(String);

impl TryFrom<Value> for String {
    type Error = String;

    fn try_from(value: Value) -> std::result::Result<Self, Self::Error> {
        Ok(value.0)
    }
}

macro_rules! parse_value_as [
    ( $( $t:ty ),+ ) => {
        $(
            impl TryFrom<Value> for $t {
                type Error = String;

                fn try_from(value: Value) -> std::result::Result<Self, Self::Error> {
                    value.0.parse::<$t>().map_err(|e| format!("Invalid {}: {}", stringify!($t), e))
                }
            }
        )+
    }
];

parse_value_as!(u16, u32, SocketAddr);

/// Durations are written as an integer with an optional `ms`, `s` or `m` suffix.  A bare number
/// means seconds.
impl TryFrom<Value> for Duration {
    type Error = String;

    fn try_from(value: Value) -> std::result::Result<Self, Self::Error> {
        let raw = value.0.trim();
        let split = raw.find(|c: char| !c.is_ascii_digit()).unwrap_or(raw.len());
        let (digits, unit) = raw.split_at(split);
        let amount =
            digits.parse::<u64>().map_err(|e| format!("Invalid Duration '{}': {}", raw, e))?;
        let millis_per_unit = match unit {
            "ms" => 1,
            "" | "s" => 1000,
            "m" => 60 * 1000,
            unit => return Err(format!("Invalid Duration '{}': unknown unit '{}'", raw, unit)),
        };
        amount
            .checked_mul(millis_per_unit)
            .map(Duration::from_millis)
            .ok_or_else(|| format!("Invalid Duration '{}': too large", raw))
    }
}

/// Reads `<prefix>_<suffix>` and converts it to `T`, returning the full variable name alongside
/// the value so that callers can report it.
fn lookup<T: TryFrom<Value, Error = String>>(
    prefix: &str,
    suffix: &str,
) -> (String, Result<Option<T>>) {
    let name = format!("{}_{}", prefix, suffix);
    let result = match env::var(&name) {
        Ok(raw) => T::try_from(Value(raw))
            .map(Some)
            .map_err(|e| format!("Invalid type in environment variable {}: {}", name, e)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => {
            Err(format!("Invalid value in environment variable {}", name))
        }
    };
    (name, result)
}

/// Gets the mandatory variable `<prefix>_<suffix>` converted to `T`.
pub fn get_required_var<T: TryFrom<Value, Error = String>>(
    prefix: &str,
    suffix: &str,
) -> Result<T> {
    let (name, result) = lookup(prefix, suffix);
    result?.ok_or_else(|| format!("Required environment variable {} not present", name))
}

/// Gets the variable `<prefix>_<suffix>` converted to `T`, or `None` if it is unset.
///
/// A variable that is set but cannot be converted is still an error.
pub fn get_optional_var<T: TryFrom<Value, Error = String>>(
    prefix: &str,
    suffix: &str,
) -> Result<Option<T>> {
    lookup(prefix, suffix).1
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    fn duration(raw: &str) -> Result<Duration> {
        Duration::try_from(Value(raw.to_owned()))
    }

    #[test]
    fn test_duration_units() {
        assert_eq!(Ok(Duration::from_secs(4)), duration("4"));
        assert_eq!(Ok(Duration::from_secs(4)), duration(" 4s "));
        assert_eq!(Ok(Duration::from_millis(1500)), duration("1500ms"));
        assert_eq!(Ok(Duration::from_secs(180)), duration("3m"));
    }

    #[test]
    fn test_duration_rejects_garbage() {
        assert!(duration("").unwrap_err().starts_with("Invalid Duration ''"));
        assert!(duration("s").unwrap_err().starts_with("Invalid Duration 's'"));
        assert_eq!(Err("Invalid Duration '1d': unknown unit 'd'".to_owned()), duration("1d"));
        assert_eq!(
            Err("Invalid Duration '999999999999999999m': too large".to_owned()),
            duration("999999999999999999m")
        );
    }

    #[test]
    fn test_numbers_and_addresses() {
        assert_eq!(Ok(25u32), u32::try_from(Value("25".to_owned())));
        assert!(u16::try_from(Value("70000".to_owned())).unwrap_err().starts_with("Invalid u16:"));

        let addr = SocketAddr::try_from(Value("0.0.0.0:8082".to_owned())).unwrap();
        assert_eq!(8082, addr.port());
        assert!(SocketAddr::try_from(Value("0.0.0.0".to_owned())).is_err());
    }

    #[test]
    fn test_optional_var_set_and_unset() {
        temp_env::with_var("PEOPLE_TEST_TIMEOUT", Some("250ms"), || {
            assert_eq!(
                Ok(Some(Duration::from_millis(250))),
                get_optional_var::<Duration>("PEOPLE_TEST", "TIMEOUT")
            );
        });
        temp_env::with_var_unset("PEOPLE_TEST_TIMEOUT", || {
            assert_eq!(Ok(None), get_optional_var::<Duration>("PEOPLE_TEST", "TIMEOUT"));
        });
    }

    #[test]
    fn test_optional_var_set_to_garbage() {
        temp_env::with_var("PEOPLE_TEST_ADDRESS", Some("nowhere"), || {
            let err = get_optional_var::<SocketAddr>("PEOPLE_TEST", "ADDRESS").unwrap_err();
            assert!(err.starts_with("Invalid type in environment variable PEOPLE_TEST_ADDRESS:"));
        });
    }

    #[test]
    fn test_required_var_present() {
        temp_env::with_var("PGSQL_TEST_URL", Some("postgres://db/people"), || {
            assert_eq!(
                Ok("postgres://db/people".to_owned()),
                get_required_var::<String>("PGSQL_TEST", "URL")
            );
        });
    }

    #[test]
    fn test_required_var_absent() {
        temp_env::with_var_unset("PGSQL_TEST_URL", || {
            assert_eq!(
                Err("Required environment variable PGSQL_TEST_URL not present".to_owned()),
                get_required_var::<String>("PGSQL_TEST", "URL")
            );
        });
    }

    #[test]
    fn test_required_var_wrong_type() {
        temp_env::with_var("PGSQL_TEST_MAX_CONNECTIONS", Some("lots"), || {
            let err = get_required_var::<u32>("PGSQL_TEST", "MAX_CONNECTIONS").unwrap_err();
            assert!(err.contains("PGSQL_TEST_MAX_CONNECTIONS: Invalid u32"));
        });
    }

    #[test]
    fn test_vars_not_utf8() {
        temp_env::with_var("PEOPLE_TEST_BINARY", Some(OsStr::from_bytes(b"\xff\xfe")), || {
            let expected = "Invalid value in environment variable PEOPLE_TEST_BINARY".to_owned();
            assert_eq!(Err(expected.clone()), get_required_var::<String>("PEOPLE_TEST", "BINARY"));
            assert_eq!(Err(expected), get_optional_var::<String>("PEOPLE_TEST", "BINARY"));
        });
    }
}
