//! Field rules shared by the JSON API and the page forms

use roastingreels_common::db::models::is_valid_score;
use std::borrow::Cow;
use validator::ValidationError;

pub const TITLE_MAX: usize = 255;

pub const TITLE_NULL: &str = "The title must not be null.";
pub const TITLE_TAKEN: &str = "This title already exist!";
pub const SCORE_BLANK: &str = "Score cannot be blank";
pub const SCORE_RANGE: &str = "Score must be between 1 and 5";

fn violation(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

pub fn movie_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(violation("blank", "The title must not be blank."));
    }
    if title.chars().count() > TITLE_MAX {
        return Err(violation(
            "length",
            "The title cannot be longer than 255 characters.",
        ));
    }
    Ok(())
}

pub fn review_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(violation("blank", "The review title must not be blank."));
    }
    if title.chars().count() > TITLE_MAX {
        return Err(violation(
            "length",
            "The review title cannot be longer than 255 characters.",
        ));
    }
    Ok(())
}

pub fn review_text(text: &str) -> Result<(), ValidationError> {
    if text.trim().is_empty() {
        return Err(violation("blank", "The review text must not be blank."));
    }
    Ok(())
}

/// Score typed into a form field
pub fn parse_score(raw: &str) -> Result<i32, &'static str> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(SCORE_BLANK);
    }
    match raw.parse::<i32>() {
        Ok(score) if is_valid_score(score) => Ok(score),
        _ => Err(SCORE_RANGE),
    }
}
