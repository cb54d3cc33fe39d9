use crate::component::ComponentInstance;
use crate::ids::{ComponentId, GameObjectId, SceneId};
use crate::observer::OnDeleteObservers;

/// A node of a scene: a named, ordered list of components.
///
/// Two relationships hang off an object and are independent of each other:
///
/// - **parenting** (`parent` / `children`): the transform hierarchy used for
///   traversal and recursive destruction;
/// - **inheritance** (`inherits_from`): the prototype whose component values
///   this object mirrors unless it divorced them.
///
/// The [`Transform`](crate::Transform) component is always present at index 0.
#[derive(Debug)]
pub struct GameObject {
    pub(crate) id: GameObjectId,
    pub(crate) name: String,
    pub(crate) enabled: bool,
    pub(crate) inherits_from: Option<GameObjectId>,
    pub(crate) parent: Option<GameObjectId>,
    pub(crate) children: Vec<GameObjectId>,
    pub(crate) components: Vec<ComponentInstance>,
    pub(crate) on_delete: OnDeleteObservers,
}

impl GameObject {
    pub(crate) fn new(id: GameObjectId, name: &str) -> Self {
        Self {
            id,
            name: name.to_owned(),
            enabled: true,
            inherits_from: None,
            parent: None,
            children: Vec::new(),
            components: Vec::new(),
            on_delete: OnDeleteObservers::default(),
        }
    }

    pub fn id(&self) -> GameObjectId {
        self.id
    }

    pub fn scene(&self) -> SceneId {
        self.id.scene
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The prototype this object inherits values from.
    pub fn inherits_from(&self) -> Option<GameObjectId> {
        self.inherits_from
    }

    pub fn parent(&self) -> Option<GameObjectId> {
        self.parent
    }

    pub fn children(&self) -> &[GameObjectId] {
        &self.children
    }

    /// Components in attachment order, Transform first.
    pub fn components(&self) -> &[ComponentInstance] {
        &self.components
    }

    pub fn transform(&self) -> Option<&ComponentInstance> {
        self.components.first()
    }

    pub fn component(&self, id: ComponentId) -> Option<&ComponentInstance> {
        self.components.iter().find(|c| c.id() == id)
    }

    pub(crate) fn component_mut(&mut self, id: ComponentId) -> Option<&mut ComponentInstance> {
        self.components.iter_mut().find(|c| c.id() == id)
    }

    /// First component of the given type. Several components of one type on
    /// the same object are not told apart by inheritance matching.
    pub fn first_component_of_type(&self, type_name: &str) -> Option<&ComponentInstance> {
        self.components.iter().find(|c| c.type_name() == type_name)
    }

    pub fn components_of_type<'a>(
        &'a self,
        type_name: &'a str,
    ) -> impl Iterator<Item = &'a ComponentInstance> + 'a {
        self.components
            .iter()
            .filter(move |c| c.type_name() == type_name)
    }

    /// Observers notified when this object is destroyed.
    pub fn delete_observers(&self) -> &OnDeleteObservers {
        &self.on_delete
    }
}
