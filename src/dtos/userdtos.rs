use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{jobmodel::Review, usermodel::{ProfileUpdate, User}};

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct RegisterUserDto {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,

    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Email is invalid")
    )]
    pub email: String,

    #[validate(
        length(min = 1, message = "Password is required"),
        length(min = 6, message = "Password must be at least 6 characters")
    )]
    pub password: String,

    #[validate(length(min = 7, max = 20, message = "Phone number must be between 7-20 characters"))]
    pub phone: Option<String>,

    #[validate(length(min = 1, max = 255, message = "Location must be between 1-255 characters"))]
    pub location: Option<String>,

    #[serde(default)]
    pub skills: Vec<String>,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct LoginUserDto {
    #[validate(length(min = 1, message = "Email is required"), email(message = "Email is invalid"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct UpdateProfileDto {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1-100 characters"))]
    pub name: Option<String>,

    #[validate(length(min = 7, max = 20, message = "Phone number must be between 7-20 characters"))]
    pub phone: Option<String>,

    #[validate(length(min = 1, max = 255, message = "Location must be between 1-255 characters"))]
    pub location: Option<String>,

    pub skills: Option<Vec<String>>,

    #[validate(length(max = 2000, message = "About must be at most 2000 characters"))]
    pub about: Option<String>,
}

impl From<UpdateProfileDto> for ProfileUpdate {
    fn from(dto: UpdateProfileDto) -> Self {
        ProfileUpdate {
            name: dto.name.map(|n| n.trim().to_string()),
            phone: dto.phone,
            location: dto.location,
            skills: dto.skills.map(normalize_skills),
            about: dto.about,
        }
    }
}

/// Trims skills and drops blanks and duplicates, keeping first-seen order.
pub fn normalize_skills(skills: Vec<String>) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(skills.len());
    for skill in skills {
        let skill = skill.trim();
        if !skill.is_empty() && !normalized.iter().any(|s| s.eq_ignore_ascii_case(skill)) {
            normalized.push(skill.to_string());
        }
    }
    normalized
}

/// The caller's own profile. Everything except the password hash.
#[derive(Debug, Serialize, Deserialize)]
pub struct FilterUserDto {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub skills: Vec<String>,
    pub about: Option<String>,
    pub rating: f64,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl FilterUserDto {
    pub fn filter_user(user: &User) -> Self {
        FilterUserDto {
            id: user.id.to_string(),
            name: user.name.to_owned(),
            email: user.email.to_owned(),
            phone: user.phone.clone(),
            location: user.location.clone(),
            skills: user.skills.clone(),
            about: user.about.clone(),
            rating: user.rating,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// What anybody may see about a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicProfileDto {
    pub id: Uuid,
    pub name: String,
    pub location: Option<String>,
    pub skills: Vec<String>,
    pub rating: f64,
}

impl PublicProfileDto {
    pub fn from_user(user: &User) -> Self {
        PublicProfileDto {
            id: user.id,
            name: user.name.to_owned(),
            location: user.location.clone(),
            skills: user.skills.clone(),
            rating: user.rating,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserData {
    pub user: FilterUserDto,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponseDto {
    pub status: String,
    pub data: UserData,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserLoginResponseDto {
    pub status: String,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserReviewsDto {
    pub user_id: Uuid,
    pub rating: f64,
    pub reviews: Vec<Review>,
}
