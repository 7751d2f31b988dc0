//! Cart invariants hold across arbitrary sequences of mutations, and survive a JSON round trip
//! through local storage.

use testresult::TestResult;

use marketplace::{
    cart::{CartAggregate, CartItem, ShopMeta},
    ids::{ItemUuid, ShopUuid},
};

fn meta() -> ShopMeta {
    ShopMeta {
        photo_url: None,
        allow_pickup: true,
        local_delivery: true,
    }
}

fn assert_invariants(cart: &CartAggregate) {
    let mut seen = Vec::new();

    for shop in cart {
        assert!(!shop.items().is_empty(), "shop {} has no items", shop.shop_id());
        assert!(
            !seen.contains(&shop.shop_id()),
            "shop {} appears twice",
            shop.shop_id()
        );

        seen.push(shop.shop_id());

        let expected = shop
            .items()
            .iter()
            .map(CartItem::line_total)
            .sum::<Result<u64, _>>();

        assert_eq!(Ok(shop.subtotal()), expected, "subtotal out of sync");

        for item in shop.items() {
            assert!(item.quantity > 0, "item {} has zero quantity", item.item_id);
        }
    }

    let total: u64 = cart.iter().map(|shop| shop.subtotal()).sum();

    assert_eq!(cart.total_subtotal(), total, "total out of sync");
}

#[test]
fn invariants_hold_through_a_shopping_session() -> TestResult {
    let bakery = ShopUuid::now_v7();
    let dairy = ShopUuid::now_v7();
    let bread = ItemUuid::now_v7();
    let buns = ItemUuid::now_v7();
    let milk = ItemUuid::now_v7();

    let mut cart = CartAggregate::new();

    cart.add_to_cart(CartItem::new(bread, "Bread", 3_25, 1), bakery, "Bakery", meta())?;
    assert_invariants(&cart);

    cart.add_to_cart(CartItem::new(milk, "Milk", 1_20, 2), dairy, "Dairy", meta())?;
    cart.add_to_cart(CartItem::new(bread, "Bread", 3_25, 2), bakery, "Bakery", meta())?;
    assert_invariants(&cart);

    assert_eq!(
        cart.shop(bakery).and_then(|shop| shop.item(bread)).map(|item| item.quantity),
        Some(3)
    );

    cart.add_to_cart(CartItem::new(buns, "Buns", 2_00, 0), bakery, "Bakery", meta())?;
    assert_invariants(&cart);
    assert!(
        cart.shop(bakery).and_then(|shop| shop.item(buns)).is_none(),
        "zero quantity should be ignored"
    );

    cart.update_item_quantity(dairy, milk, 0)?;
    assert_invariants(&cart);
    assert!(cart.shop(dairy).is_none(), "emptied shop should be pruned");

    cart.update_item_quantity(bakery, bread, 5)?;
    assert_invariants(&cart);
    assert_eq!(cart.total_subtotal(), 16_25);

    let restored = CartAggregate::from_json(&cart.to_json()?)?;

    assert_eq!(restored, cart);
    assert_invariants(&restored);

    cart.remove_from_cart(bakery, bread)?;
    assert_invariants(&cart);
    assert!(cart.is_empty(), "cart should be empty");

    Ok(())
}

#[test]
fn saved_cart_with_inconsistent_subtotals_is_repaired() -> TestResult {
    let shop = ShopUuid::now_v7();
    let item = ItemUuid::now_v7();

    let json = format!(
        r#"[{{
            "shop_id": "{shop}",
            "shop_name": "Bakery",
            "shop_photo_url": null,
            "allow_pickup": true,
            "local_delivery": false,
            "items": [{{
                "item_id": "{item}",
                "name": "Bread",
                "price": 300,
                "quantity": 2,
                "photo_url": null,
                "negotiable": false
            }}],
            "subtotal": 1
        }}]"#
    );

    let cart = CartAggregate::from_json(&json)?;

    assert_invariants(&cart);
    assert_eq!(cart.total_subtotal(), 6_00);

    Ok(())
}
