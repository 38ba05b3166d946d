use crate::error::Result;
use crate::object::{object_kind, write_object, Object};
use crate::ops::commit::author_timestamp;
use crate::refs;
use crate::repo::Repository;
use crate::resolve::find_object;
use crate::types::{Kvlm, Tag};

/// tag names under refs/tags, sorted
pub fn tag_list(repo: &Repository) -> Result<Vec<String>> {
    let map = refs::list_refs(repo, Some("refs/tags"))?;
    Ok(refs::flatten_refs(&map, "")
        .into_iter()
        .map(|(name, _)| name)
        .collect())
}

/// create a tag for `target` (any name the resolver accepts)
///
/// a lightweight tag is just a ref to the resolved object; with `annotate`
/// a tag object carrying tagger and message is written and referenced instead
pub fn tag_create(
    repo: &Repository,
    name: &str,
    target: &str,
    annotate: bool,
    tagger: &str,
    message: &str,
) -> Result<()> {
    let id = find_object(repo, target, None, true)?;

    let ref_id = if annotate {
        let kind = object_kind(repo, &id)?;
        let mut kvlm = Kvlm::new();
        kvlm.push("object", id.to_hex());
        kvlm.push("type", kind.as_str());
        kvlm.push("tag", name);
        kvlm.push("tagger", format!("{} {}", tagger, author_timestamp()));
        kvlm.set_message(format!("{}\n", message));
        write_object(repo, &Object::Tag(Tag::from_kvlm(kvlm)))?
    } else {
        id
    };

    refs::ref_create(repo, &format!("refs/tags/{}", name), &ref_id)
}
