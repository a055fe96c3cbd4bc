use crate::models::models::PostView;

/// Case-insensitive substring match on content or author name.
/// An empty term matches everything.
pub fn matches(post: &PostView, term: &str) -> bool {
    let term = term.to_lowercase();
    if term.is_empty() {
        return true;
    }
    post.post.content.to_lowercase().contains(&term)
        || post.post.author_name.to_lowercase().contains(&term)
}

pub fn filter_posts<'a, I>(posts: I, term: &str) -> Vec<&'a PostView>
where
    I: IntoIterator<Item = &'a PostView>,
{
    posts.into_iter().filter(|p| matches(p, term)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::models::Post;

    fn view(content: &str, author: &str) -> PostView {
        PostView::bare(Post {
            id: content.to_string(),
            user_id: "u".into(),
            author_name: author.into(),
            content: content.into(),
            media_url: None,
            media_type: None,
            created_at: "2026-01-01T00:00:00+00:00".into(),
        })
    }

    #[test]
    fn hello_matches_once() {
        let posts = vec![view("hello world", "A"), view("goodbye", "B")];
        let found = filter_posts(&posts, "hello");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].post.content, "hello world");
    }

    #[test]
    fn matches_author_case_insensitively() {
        let posts = vec![view("dil", "Mirza Ghalib"), view("jaan", "Faiz"), view("GHALIB ka sher", "Zoya")];
        let found = filter_posts(&posts, "ghalib");
        let ids: Vec<&str> = found.iter().map(|p| p.id()).collect();
        assert_eq!(ids, vec!["dil", "GHALIB ka sher"]);
    }

    #[test]
    fn empty_term_matches_all() {
        let posts = vec![view("a", "x"), view("b", "y")];
        assert_eq!(filter_posts(&posts, "").len(), 2);
        assert!(filter_posts(&posts, "  ").is_empty());
    }

    #[test]
    fn leading_space_is_part_of_the_term() {
        let posts = vec![view("hello world", "A"), view("say hello", "B")];
        let found = filter_posts(&posts, " hello");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].post.content, "say hello");
    }
}
