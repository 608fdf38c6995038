//! Grade and access-key gating for per-video endpoints.
//!
//! A video tagged with a grade may only be streamed or viewed by a caller
//! that names the same grade, the grade is currently allowed, and, when an
//! access key is configured for that grade, the caller presents it. Untagged
//! videos are open. Gating runs before any state is touched.

use std::collections::{BTreeMap, HashSet};

use axum::http::HeaderMap;
use cr_core::{Error, Result};
use cr_store::models::Video;
use serde::Deserialize;

/// Header alternative to the `accessKey` query parameter.
pub const ACCESS_KEY_HEADER: &str = "x-access-key";

/// Query parameters accepted by gated endpoints.
#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AccessParams {
    /// Grade the caller is browsing under.
    pub grade: Option<String>,
    /// Access key for the grade, if one is configured.
    pub access_key: Option<String>,
}

impl AccessParams {
    /// The access key from the query string, else from the header.
    fn presented_key<'a>(&'a self, headers: &'a HeaderMap) -> Option<&'a str> {
        self.access_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .or_else(|| {
                headers
                    .get(ACCESS_KEY_HEADER)?
                    .to_str()
                    .ok()
                    .map(str::trim)
                    .filter(|k| !k.is_empty())
            })
    }
}

/// Check that the caller may access `video`.
pub fn check(
    video: &Video,
    params: &AccessParams,
    headers: &HeaderMap,
    allowed: &HashSet<String>,
    access_keys: &BTreeMap<String, String>,
) -> Result<()> {
    let Some(video_grade) = video.grade_tag() else {
        return Ok(());
    };

    let requested = params
        .grade
        .as_deref()
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .ok_or_else(|| Error::Validation("grade parameter is required".into()))?;

    if requested != video_grade {
        return Err(Error::Forbidden("grade does not match this video".into()));
    }

    if !allowed.is_empty() && !allowed.contains(video_grade) {
        return Err(Error::Forbidden(format!("grade '{video_grade}' is not available")));
    }

    if let Some(expected) = access_keys.get(video_grade).filter(|k| !k.is_empty()) {
        match params.presented_key(headers) {
            None => return Err(Error::Forbidden("access key is required".into())),
            Some(key) if key != expected => {
                return Err(Error::Forbidden("access key is incorrect".into()))
            }
            Some(_) => {}
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn video(grade: Option<&str>) -> Video {
        Video::new_local("a.mp4", "1-a.mp4", "video/mp4", 10, grade.map(String::from))
    }

    fn params(grade: Option<&str>, key: Option<&str>) -> AccessParams {
        AccessParams {
            grade: grade.map(String::from),
            access_key: key.map(String::from),
        }
    }

    fn allowed() -> HashSet<String> {
        ["Grade 7", "Grade 8"].into_iter().map(String::from).collect()
    }

    fn keys() -> BTreeMap<String, String> {
        BTreeMap::from([("Grade 8".to_string(), "owl".to_string())])
    }

    fn run(video: &Video, params: &AccessParams, headers: &HeaderMap) -> Result<()> {
        check(video, params, headers, &allowed(), &keys())
    }

    #[test]
    fn untagged_video_is_open() {
        assert!(run(&video(None), &AccessParams::default(), &HeaderMap::new()).is_ok());
    }

    #[test]
    fn missing_grade_is_validation_error() {
        let err = run(&video(Some("Grade 7")), &params(None, None), &HeaderMap::new()).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let err = run(&video(Some("Grade 7")), &params(Some("  "), None), &HeaderMap::new()).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn mismatched_grade_is_forbidden() {
        let err = run(&video(Some("Grade 7")), &params(Some("Grade 8"), None), &HeaderMap::new())
            .unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));
    }

    #[test]
    fn disallowed_grade_is_forbidden() {
        let err = run(&video(Some("Grade 9")), &params(Some("Grade 9"), None), &HeaderMap::new())
            .unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));
    }

    #[test]
    fn empty_allowed_set_allows_any_grade() {
        let v = video(Some("Grade 12"));
        let p = params(Some("Grade 12"), None);
        assert!(check(&v, &p, &HeaderMap::new(), &HashSet::new(), &BTreeMap::new()).is_ok());
    }

    #[test]
    fn matching_grade_without_key_requirement_passes() {
        assert!(run(&video(Some("Grade 7")), &params(Some(" Grade 7 "), None), &HeaderMap::new()).is_ok());
    }

    #[test]
    fn access_key_is_enforced() {
        let v = video(Some("Grade 8"));
        let headers = HeaderMap::new();

        let missing = run(&v, &params(Some("Grade 8"), None), &headers).unwrap_err();
        assert!(matches!(missing, Error::Forbidden(_)));

        let wrong = run(&v, &params(Some("Grade 8"), Some("cat")), &headers).unwrap_err();
        assert!(matches!(wrong, Error::Forbidden(_)));

        assert!(run(&v, &params(Some("Grade 8"), Some("owl")), &headers).is_ok());
    }

    #[test]
    fn access_key_may_come_from_header() {
        let mut headers = HeaderMap::new();
        headers.insert(ACCESS_KEY_HEADER, HeaderValue::from_static("owl"));
        assert!(run(&video(Some("Grade 8")), &params(Some("Grade 8"), None), &headers).is_ok());
    }

    #[test]
    fn blank_query_key_falls_back_to_header() {
        let mut headers = HeaderMap::new();
        headers.insert(ACCESS_KEY_HEADER, HeaderValue::from_static("owl"));
        let v = video(Some("Grade 8"));

        assert!(run(&v, &params(Some("Grade 8"), Some("   ")), &headers).is_ok());

        let err = run(&v, &params(Some("Grade 8"), Some("   ")), &HeaderMap::new()).unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));
    }
}
