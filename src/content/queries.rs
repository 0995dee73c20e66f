//! Store query strings.
//!
//! Every data access function pins one of these projections; the field
//! names here are the wire contract the `domain::entities` serde
//! attributes decode.

pub const ALL_POSTS: &str = r#"*[_type == "post"] | order(publishedAt desc) {
    _id, title, slug, excerpt,
    "bodyText": pt::text(body),
    publishedAt,
    "author": author->{ name, "image": image.asset->url },
    "categories": categories[]->title
}"#;

pub const FEATURED_POSTS: &str = r#"*[_type == "post"] | order(publishedAt desc) [0...$limit] {
    _id, title, slug, excerpt,
    "bodyText": pt::text(body),
    publishedAt,
    "author": author->{ name, "image": image.asset->url },
    "categories": categories[]->title
}"#;

pub const POST_BY_SLUG: &str = r#"*[_type == "post" && slug.current == $slug][0] {
    _id, title, slug, excerpt,
    "bodyText": pt::text(body),
    publishedAt,
    "author": author->{ name, "image": image.asset->url },
    "categories": categories[]->title
}"#;

pub const POST_SLUGS: &str = r#"*[_type == "post"].slug.current"#;

pub const POSTS_BY_CATEGORY: &str =
    r#"*[_type == "post" && $category in categories[]->title] | order(publishedAt desc) {
    _id, title, slug, excerpt,
    "bodyText": pt::text(body),
    publishedAt,
    "categories": categories[]->title
}"#;

pub const RELATED_POSTS: &str =
    r#"*[_type == "post" && slug.current != $slug] | order(publishedAt desc) [0...$limit] {
    _id, title, slug, excerpt, publishedAt,
    "categories": categories[]->title
}"#;

pub const ALL_PROJECTS: &str = r#"*[_type == "project"] | order(order asc) {
    _id, title, slug, excerpt, description,
    "bodyText": pt::text(body),
    technologies,
    "categories": categories[]->title,
    links, featured, order
}"#;

pub const FEATURED_PROJECTS: &str =
    r#"*[_type == "project" && featured == true] | order(order asc) {
    _id, title, slug, excerpt, description,
    "bodyText": pt::text(body),
    technologies,
    "categories": categories[]->title,
    links, featured, order
}"#;

pub const PROJECT_BY_SLUG: &str = r#"*[_type == "project" && slug.current == $slug][0] {
    _id, title, slug, excerpt, description,
    "bodyText": pt::text(body),
    technologies,
    "categories": categories[]->title,
    links, featured, order
}"#;

pub const PAGE_BY_SLUG: &str = r#"*[_type == "page" && slug.current == $slug][0] {
    _id, title, slug,
    "bodyText": pt::text(body)
}"#;

pub const SITE_SETTINGS: &str = r#"*[_type == "siteSettings"][0] {
    title, description,
    "socialLinks": socialLinks[]{ label, url },
    "analyticsId": analyticsId
}"#;

pub const POST_COUNT: &str = r#"count(*[_type == "post"])"#;
