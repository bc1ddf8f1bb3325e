/// Derived views over the collection
///
/// Pure functions of store state: which artworks are visible under a filter,
/// and which artwork is previous/next from the current one.

use super::data::{Artwork, ArtworkId, Direction, Filter};

/// Artworks that pass `filter`, in collection order.
///
/// `Filter::All` returns every artwork. A tool with no matches gives an empty list.
pub fn visible_list<'a>(artworks: &'a [Artwork], filter: &Filter) -> Vec<&'a Artwork> {
    artworks.iter().filter(|a| filter.matches(a)).collect()
}

/// The artwork before or after `current` in `visible`, wrapping around at either end.
///
/// Returns `None` when `current` is not in `visible` (e.g. the filter changed
/// underneath the selection) or `visible` is empty; callers keep their selection.
pub fn navigate<'a>(
    visible: &[&'a Artwork],
    current: ArtworkId,
    direction: Direction,
) -> Option<&'a Artwork> {
    let index = visible.iter().position(|a| a.id == current)?;
    let len = visible.len();

    let target = match direction {
        Direction::Prev => (index + len - 1) % len,
        Direction::Next => (index + 1) % len,
    };

    Some(visible[target])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artwork(id: ArtworkId, tool: &str) -> Artwork {
        Artwork {
            id,
            image_url: format!("data:image/png;base64,{}", id),
            tool: tool.into(),
            series: "S".into(),
            year: 2025,
            month: 1,
            prompt: "p".into(),
        }
    }

    fn ids(list: &[&Artwork]) -> Vec<ArtworkId> {
        list.iter().map(|a| a.id).collect()
    }

    #[test]
    fn test_all_returns_collection_unchanged() {
        let artworks = vec![artwork(3, "Midjourney"), artwork(2, "Nanobanana"), artwork(1, "Midjourney")];
        assert_eq!(ids(&visible_list(&artworks, &Filter::All)), vec![3, 2, 1]);
    }

    #[test]
    fn test_tool_filter_keeps_relative_order() {
        let artworks = vec![
            artwork(4, "Midjourney"),
            artwork(3, "Nanobanana"),
            artwork(2, "Midjourney"),
            artwork(1, "Custom"),
        ];

        let visible = visible_list(&artworks, &Filter::Tool("Midjourney".into()));
        assert_eq!(ids(&visible), vec![4, 2]);

        let visible = visible_list(&artworks, &Filter::Tool("Custom".into()));
        assert_eq!(ids(&visible), vec![1]);
    }

    #[test]
    fn test_lowercase_all_filters_to_that_tool() {
        let artworks = vec![artwork(2, "all"), artwork(1, "Midjourney")];

        let visible = visible_list(&artworks, &"all".parse().unwrap());
        assert_eq!(ids(&visible), vec![2]);
    }

    #[test]
    fn test_unmatched_filter_is_empty() {
        let artworks = vec![artwork(1, "Midjourney")];
        assert!(visible_list(&artworks, &Filter::Tool("Nanobanana".into())).is_empty());
    }

    #[test]
    fn test_navigation_wraps_around() {
        let artworks = vec![artwork(10, "A"), artwork(20, "A"), artwork(30, "A")];
        let visible = visible_list(&artworks, &Filter::All);

        assert_eq!(navigate(&visible, 20, Direction::Next).unwrap().id, 30);
        assert_eq!(navigate(&visible, 30, Direction::Next).unwrap().id, 10);
        assert_eq!(navigate(&visible, 10, Direction::Prev).unwrap().id, 30);
        assert_eq!(navigate(&visible, 20, Direction::Prev).unwrap().id, 10);
    }

    #[test]
    fn test_single_item_navigates_to_itself() {
        let artworks = vec![artwork(1, "A")];
        let visible = visible_list(&artworks, &Filter::All);

        assert_eq!(navigate(&visible, 1, Direction::Next).unwrap().id, 1);
        assert_eq!(navigate(&visible, 1, Direction::Prev).unwrap().id, 1);
    }

    #[test]
    fn test_hidden_current_has_no_target() {
        let artworks = vec![artwork(1, "A"), artwork(2, "B")];
        let visible = visible_list(&artworks, &Filter::Tool("A".into()));

        assert!(navigate(&visible, 2, Direction::Next).is_none());
        assert!(navigate(&[], 2, Direction::Prev).is_none());
    }
}
