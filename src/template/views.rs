//! Built-in HTML views compiled into the binary.

/// Name of the view every page is wrapped in.
pub const LAYOUT_VIEW: &str = "layout";

/// All built-in views as `(name, source)` pairs.
pub const BUILTIN_VIEWS: &[(&str, &str)] = &[
    (LAYOUT_VIEW, include_str!("../../templates/layout.html")),
    ("home/index", include_str!("../../templates/home/index.html")),
    ("doctor/profile", include_str!("../../templates/doctor/profile.html")),
    ("doctor/list", include_str!("../../templates/doctor/list.html")),
    ("doctor/add_details", include_str!("../../templates/doctor/add_details.html")),
    ("auth/register", include_str!("../../templates/auth/register.html")),
    ("auth/login", include_str!("../../templates/auth/login.html")),
    ("user/profile", include_str!("../../templates/user/profile.html")),
    ("user/edit", include_str!("../../templates/user/edit.html")),
    ("file/upload", include_str!("../../templates/file/upload.html")),
    ("file/show", include_str!("../../templates/file/show.html")),
    ("file/list", include_str!("../../templates/file/list.html")),
    ("error/error", include_str!("../../templates/error/error.html")),
];
