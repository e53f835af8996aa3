macro_rules! post_columns {
    () => {
        "p.id, p.slug, p.title, p.excerpt, p.content, p.category, p.published, \
         p.view_count, p.created_at, p.updated_at"
    };
}

mod query;
mod read;
mod types;
mod write;

const SELECT_POSTS: &str = concat!("SELECT ", post_columns!(), " FROM posts p");
