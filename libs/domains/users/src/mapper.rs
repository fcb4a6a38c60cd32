use crate::models::{User, UserRequest, UserResponse};

/// Builds an unsaved record from a request.
pub fn to_user(request: UserRequest) -> User {
    User::new(Some(request.name), Some(request.email), request.roles)
}

/// Overlays name and roles from `request`; id and email are left alone.
pub fn update_user(request: UserRequest, user: &mut User) {
    user.name = Some(request.name);
    user.roles = request.roles;
}

pub fn to_response(user: User) -> UserResponse {
    UserResponse {
        name: user.name,
        email: user.email,
        roles: user.roles,
    }
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        to_response(user)
    }
}
